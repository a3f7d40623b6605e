use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::uploads::UploadError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldIssue>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// An external screening service turned the request away.
    #[error("{message}")]
    Rejected { message: String, code: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_) | Self::Internal(_))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::Rejected { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(issues) => json!({
                "success": false,
                "error": self.to_string(),
                "details": issues,
            }),
            Self::Rejected { message, code } => json!({
                "success": false,
                "error": message,
                "code": code,
            }),
            _ if self.is_internal() => {
                log::error!("Request failed: {self}");
                json!({ "success": false, "error": "Internal server error" })
            }
            _ => json!({ "success": false, "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotFound => ApiError::NotFound(UploadError::NotFound.to_string()),
            UploadError::Io(io) => ApiError::Io(io),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Maps a unique-constraint violation to a conflict, anything else passes through.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::Conflict(message.to_string())
        }
        _ => ApiError::Database(err),
    }
}
