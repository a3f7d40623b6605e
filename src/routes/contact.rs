use actix_web::{middleware::from_fn, web, HttpResponse};
use serde_json::json;

use crate::{
    auth::admin_guard,
    db,
    error::ApiError,
    forms::ContactForm,
    models::ContactRow,
    screening::screen_contact,
    state::AppState,
};

const CONTACT_COLUMNS: &str = "id, name, subject, phone, email, message, created_at, updated_at";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/contact")
            .service(web::resource("/contactForm").route(web::post().to(submit)))
            .service(
                web::resource("/getAllContacts")
                    .wrap(from_fn(admin_guard))
                    .route(web::get().to(list_contacts)),
            )
            .service(
                web::resource("/contactById/{id}")
                    .wrap(from_fn(admin_guard))
                    .route(web::get().to(contact_detail))
                    .route(web::delete().to(delete_contact)),
            ),
    );
}

/// Stores a message only after both the captcha and phone checks pass.
async fn submit(
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<HttpResponse, ApiError> {
    let submission = form.into_inner().into_submission()?;
    screen_contact(
        state.captcha.as_ref(),
        state.phones.as_ref(),
        &submission.captcha_token,
        &submission.phone,
    )
    .await?;

    let now = db::now();
    sqlx::query(
        r#"INSERT INTO contacts (id, name, subject, phone, email, message, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(db::new_id())
    .bind(&submission.name)
    .bind(&submission.subject)
    .bind(&submission.phone)
    .bind(&submission.email)
    .bind(&submission.message)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn list_contacts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let contacts = sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC, id"
    ))
    .fetch_all(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "contacts": contacts })))
}

async fn contact_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let contact = sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ? LIMIT 1"
    ))
    .bind(path.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Contact"))?;

    Ok(HttpResponse::Ok().json(json!({ "contact": contact })))
}

async fn delete_contact(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(path.as_str())
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Contact"));
    }

    log::info!("Deleted contact message {}", path.as_str());
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
