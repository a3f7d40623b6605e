use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ApiError,
    state::AppState,
    uploads::{UploadError, UploadStore, MAX_UPLOAD_BYTES},
};

const FILE_FIELD: &str = "file";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/uploads").route(web::post().to(upload)))
        .service(web::resource("/api/uploads/delete").route(web::delete().to(delete_upload)))
        .service(web::resource("/api/uploads/{tail:.*}").route(web::get().to(serve_upload)));
}

fn multipart_error(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid upload: {err}"))
}

async fn upload(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mime = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        UploadStore::extension_for(&mime)?;
        let original_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(UploadError::TooLarge.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        let stored = state.uploads.store(&original_name, &mime, &bytes).await?;
        log::info!("Stored upload {} ({} bytes)", stored.name, stored.size);
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "url": stored.url,
            "name": stored.name,
            "size": stored.size,
            "type": stored.mime,
        })));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

#[derive(Deserialize)]
struct DeleteQuery {
    url: Option<String>,
}

async fn delete_upload(
    state: web::Data<AppState>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, ApiError> {
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image URL is required".to_string()))?;

    state.uploads.remove(url).await?;
    log::info!("Deleted upload {url}");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image deleted successfully",
    })))
}

async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (bytes, content_type) = state.uploads.open(&path).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}
