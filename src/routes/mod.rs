use actix_web::web;

use crate::error::ApiError;

pub mod admin;
pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod pages;
pub mod public;
pub mod uploads;

/// Registers every API route; state is supplied by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid request body: {err}")).into()),
    )
    .configure(public::configure)
    .configure(auth::configure)
    .configure(admin::configure)
    .configure(pages::configure)
    .configure(contact::configure)
    .configure(uploads::configure);
}
