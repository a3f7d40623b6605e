use actix_web::{
    body::{BoxBody, MessageBody},
    cookie::{time::Duration, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{db, error::ApiError, state::AppState};

pub const SESSION_COOKIE: &str = "admin_token";
pub const SESSION_TTL_SECS: u64 = 8 * 60 * 60;

const LOGIN_PAGE: &str = "/admin/auth/login";
const DASHBOARD_PAGE: &str = "/admin/dashboard";

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: String,
    iat: u64,
    exp: u64,
}

/// A verified admin session, attached to requests that pass the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: String,
    pub expires_at: u64,
}

#[derive(Debug)]
pub enum SessionState {
    Anonymous,
    Authenticated(AdminSession),
    Rejected(jsonwebtoken::errors::Error),
}

impl SessionState {
    pub fn session(self) -> Option<AdminSession> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, admin_id: &str) -> Result<String, ApiError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        self.issue_at(admin_id, now)
    }

    fn issue_at(&self, admin_id: &str, issued_at: u64) -> Result<String, ApiError> {
        let claims = Claims {
            id: admin_id.to_string(),
            iat: issued_at,
            exp: issued_at + SESSION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<AdminSession, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(AdminSession {
            admin_id: data.claims.id,
            expires_at: data.claims.exp,
        })
    }

    pub fn inspect(&self, token: Option<String>) -> SessionState {
        match token {
            None => SessionState::Anonymous,
            Some(token) => match self.verify(&token) {
                Ok(session) => SessionState::Authenticated(session),
                Err(err) => SessionState::Rejected(err),
            },
        }
    }
}

/// Reads the session token from the cookie, falling back to a bearer header.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(SESSION_TTL_SECS as i64))
        .finish()
}

pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(0))
        .finish()
}

fn session_state(req: &ServiceRequest) -> SessionState {
    match req.app_data::<web::Data<AppState>>() {
        Some(state) => state.sessions.inspect(token_from_request(req.request())),
        None => SessionState::Anonymous,
    }
}

/// Confirms the session still names an existing admin account.
async fn ensure_admin(req: &ServiceRequest, session: &AdminSession) -> Result<(), ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
    db::fetch_admin_by_id(&state.db, &session.admin_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Admin"))
}

/// Rejects admin API calls without a valid, unexpired session token for an
/// existing admin.
pub async fn admin_guard<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: MessageBody + 'static,
{
    match session_state(&req) {
        SessionState::Authenticated(session) => {
            if let Err(err) = ensure_admin(&req, &session).await {
                log::debug!("Session for {} refused on {}: {err}", session.admin_id, req.path());
                return Ok(req.into_response(err.error_response()));
            }
            log::debug!(
                "Admin {} on {} (session expires at {})",
                session.admin_id,
                req.path(),
                session.expires_at
            );
            req.extensions_mut().insert(session);
            let res = next.call(req).await?;
            Ok(res.map_into_boxed_body())
        }
        SessionState::Rejected(err) => {
            log::debug!("Rejected admin token on {}: {err}", req.path());
            Ok(req.into_response(ApiError::unauthorized().error_response()))
        }
        SessionState::Anonymous => Ok(req.into_response(ApiError::unauthorized().error_response())),
    }
}

/// Redirects dashboard page requests between login and dashboard by session state.
pub async fn page_guard<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: MessageBody + 'static,
{
    let signed_in = session_state(&req).session().is_some();
    let path = req.path().trim_end_matches('/');

    let redirect = match path {
        "/admin" if signed_in => Some(DASHBOARD_PAGE),
        "/admin" => Some(LOGIN_PAGE),
        LOGIN_PAGE if signed_in => Some(DASHBOARD_PAGE),
        LOGIN_PAGE => None,
        _ if !signed_in => Some(LOGIN_PAGE),
        _ => None,
    };

    if let Some(location) = redirect {
        let response = HttpResponse::Found()
            .insert_header((header::LOCATION, location))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish();
        return Ok(req.into_response(response));
    }

    let res = next.call(req).await?;
    Ok(res.map_into_boxed_body())
}
