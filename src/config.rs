use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use rand_core::{OsRng, RngCore};

pub const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
pub const DEFAULT_IPQS_BASE_URL: &str = "https://ipqualityscore.com/api/json/phone";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub production: bool,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub recaptcha_secret: String,
    pub recaptcha_verify_url: String,
    pub ipqs_api_key: Option<String>,
    pub ipqs_base_url: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    key: &'static str,
    message: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| {
            log::warn!("JWT_SECRET not set. Generating a per-process secret; sessions will not survive a restart.");
            random_secret()
        });

        let recaptcha_secret = optional("RECAPTCHA_SECRET").unwrap_or_else(|| {
            log::warn!("RECAPTCHA_SECRET not set. Contact form submissions will fail verification.");
            String::new()
        });

        let ipqs_api_key = optional("IPQS_API_KEY");
        if ipqs_api_key.is_none() {
            log::info!("IPQS_API_KEY not set, phone risk screening is disabled");
        }

        let admin_password = optional("ADMIN_PASSWORD").unwrap_or_else(|| {
            log::warn!("ADMIN_PASSWORD not set. Using default password 'change-me-now'. Set ADMIN_PASSWORD in production.");
            "change-me-now".to_string()
        });

        Ok(Self {
            database_url: with_default("DATABASE_URL", "sqlite://./data/astroface.db"),
            port: parsed("PORT", "8080")?,
            production: with_default("APP_ENV", "development").eq_ignore_ascii_case("production"),
            jwt_secret,
            upload_dir: PathBuf::from(with_default("UPLOAD_DIR", "./public/uploads")),
            static_dir: PathBuf::from(with_default("STATIC_DIR", "./public")),
            recaptcha_secret,
            recaptcha_verify_url: with_default("RECAPTCHA_VERIFY_URL", DEFAULT_RECAPTCHA_VERIFY_URL),
            ipqs_api_key,
            ipqs_base_url: with_default("IPQS_BASE_URL", DEFAULT_IPQS_BASE_URL),
            admin_email: with_default("ADMIN_EMAIL", "admin@example.com"),
            admin_password,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn with_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parsed<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    with_default(key, default)
        .parse()
        .map_err(|err: T::Err| ConfigError {
            key,
            message: err.to_string(),
        })
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
