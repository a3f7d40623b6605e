use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    auth::SessionKeys,
    config::Config,
    screening::{CaptchaVerifier, IpqsPhoneScreen, PhoneScreen, RecaptchaVerifier, ScreeningError},
    uploads::UploadStore,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionKeys,
    pub uploads: UploadStore,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub phones: Arc<dyn PhoneScreen>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn from_config(db: SqlitePool, config: &Config) -> Result<Self, ScreeningError> {
        let captcha = RecaptchaVerifier::new(
            config.recaptcha_verify_url.clone(),
            config.recaptcha_secret.clone(),
        )?;
        let phones = IpqsPhoneScreen::new(config.ipqs_base_url.clone(), config.ipqs_api_key.clone())?;

        Ok(Self {
            db,
            sessions: SessionKeys::new(&config.jwt_secret),
            uploads: UploadStore::new(config.upload_dir.clone()),
            captcha: Arc::new(captcha),
            phones: Arc::new(phones),
            secure_cookies: config.production,
        })
    }
}
