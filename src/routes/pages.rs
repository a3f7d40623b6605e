use actix_web::{middleware::from_fn, web, HttpResponse};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

use crate::{
    auth::{admin_guard, AdminSession},
    db,
    error::ApiError,
    forms::{ContactDetailsForm, PageForm},
    models::{ContactDetailsRow, PageContentRow, PageKind},
    state::AppState,
};

const PAGE_COLUMNS: &str = "id, name, description, image, created_at, updated_at";
const CONTACT_DETAILS_COLUMNS: &str =
    "id, phone1, phone2, whatsapp, email, address, created_at, updated_at";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/user/pages/{page}").route(web::get().to(public_page)))
        .service(
            web::resource("/api/admin/pages/{page}")
                .route(web::get().to(admin_page))
                .route(web::post().to(save_page).wrap(from_fn(admin_guard))),
        )
        .service(
            web::resource("/api/user/contact-details").route(web::get().to(contact_details)),
        )
        .service(
            web::resource("/api/admin/contact-details")
                .route(web::get().to(contact_details))
                .route(web::post().to(save_contact_details).wrap(from_fn(admin_guard))),
        );
}

fn page_kind(slug: &str) -> Result<PageKind, ApiError> {
    PageKind::from_slug(slug).ok_or_else(|| ApiError::not_found("Page"))
}

async fn fetch_page(pool: &SqlitePool, page: PageKind) -> Result<Option<PageContentRow>, sqlx::Error> {
    sqlx::query_as::<_, PageContentRow>(&format!(
        "SELECT {PAGE_COLUMNS} FROM page_contents WHERE page = ? LIMIT 1"
    ))
    .bind(page.slug())
    .fetch_optional(pool)
    .await
}

async fn public_page(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let page = page_kind(&path)?;
    let content = fetch_page(&state.db, page).await?;

    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(
        page.public_key().to_string(),
        serde_json::to_value(content).map_err(|err| ApiError::Internal(err.to_string()))?,
    );
    Ok(HttpResponse::Ok().json(Value::Object(body)))
}

async fn admin_page(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let page = page_kind(&path)?;
    let content = fetch_page(&state.db, page).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": content })))
}

/// Creates the page row on first save and overwrites it afterwards.
async fn save_page(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
    form: web::Json<PageForm>,
) -> Result<HttpResponse, ApiError> {
    let page = page_kind(&path)?;
    let content = form.into_inner().into_content(page)?;
    let now = db::now();

    let row = sqlx::query_as::<_, PageContentRow>(&format!(
        r#"INSERT INTO page_contents (page, id, name, description, image, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(page) DO UPDATE SET
               name = excluded.name,
               description = excluded.description,
               image = excluded.image,
               updated_at = excluded.updated_at
           RETURNING {PAGE_COLUMNS}"#
    ))
    .bind(page.slug())
    .bind(db::new_id())
    .bind(&content.name)
    .bind(&content.description)
    .bind(&content.image)
    .bind(&now)
    .bind(&now)
    .fetch_one(&state.db)
    .await?;

    log::info!("Admin {} saved page {}", session.admin_id, page.slug());
    Ok(HttpResponse::Ok().json(json!({ "data": row })))
}

async fn contact_details(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let details = sqlx::query_as::<_, ContactDetailsRow>(&format!(
        "SELECT {CONTACT_DETAILS_COLUMNS} FROM contact_details LIMIT 1"
    ))
    .fetch_optional(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": details })))
}

/// Omitted fields keep their stored values.
async fn save_contact_details(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Json<ContactDetailsForm>,
) -> Result<HttpResponse, ApiError> {
    let details = form.into_inner().checked()?;
    let now = db::now();

    let row = sqlx::query_as::<_, ContactDetailsRow>(&format!(
        r#"INSERT INTO contact_details
               (singleton, id, phone1, phone2, whatsapp, email, address, created_at, updated_at)
           VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(singleton) DO UPDATE SET
               phone1 = COALESCE(excluded.phone1, contact_details.phone1),
               phone2 = COALESCE(excluded.phone2, contact_details.phone2),
               whatsapp = COALESCE(excluded.whatsapp, contact_details.whatsapp),
               email = COALESCE(excluded.email, contact_details.email),
               address = COALESCE(excluded.address, contact_details.address),
               updated_at = excluded.updated_at
           RETURNING {CONTACT_DETAILS_COLUMNS}"#
    ))
    .bind(db::new_id())
    .bind(&details.phone1)
    .bind(&details.phone2)
    .bind(&details.whatsapp)
    .bind(&details.email)
    .bind(&details.address)
    .bind(&now)
    .bind(&now)
    .fetch_one(&state.db)
    .await?;

    log::info!("Admin {} saved contact details", session.admin_id);
    Ok(HttpResponse::Ok().json(json!({ "data": row })))
}
