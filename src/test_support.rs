use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use actix_web::web;
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tempfile::TempDir;

use crate::{
    auth::SessionKeys,
    db, routes,
    screening::{CaptchaOutcome, CaptchaVerifier, PhoneScreen, PhoneVerdict, ScreeningError},
    state::AppState,
    uploads::UploadStore,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";

pub struct FixedCaptcha {
    outcome: CaptchaOutcome,
}

impl FixedCaptcha {
    pub fn passing() -> Self {
        Self {
            outcome: CaptchaOutcome {
                success: true,
                score: Some(0.9),
            },
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: CaptchaOutcome {
                success: false,
                score: None,
            },
        }
    }
}

#[async_trait]
impl CaptchaVerifier for FixedCaptcha {
    async fn verify(&self, _token: &str) -> Result<CaptchaOutcome, ScreeningError> {
        Ok(self.outcome.clone())
    }
}

pub struct FixedPhoneScreen {
    verdict: PhoneVerdict,
    calls: AtomicUsize,
}

impl FixedPhoneScreen {
    pub fn new(verdict: PhoneVerdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhoneScreen for FixedPhoneScreen {
    async fn screen(&self, _phone: &str) -> PhoneVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

/// Single-connection in-memory database with the schema applied.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("open in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrations apply");
    pool
}

pub struct TestEnv {
    pub state: AppState,
    pub phones: Arc<FixedPhoneScreen>,
    pub admin_id: String,
    _uploads: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_gates(FixedCaptcha::passing(), PhoneVerdict::Clear).await
    }

    pub async fn with_gates(captcha: FixedCaptcha, verdict: PhoneVerdict) -> Self {
        let pool = memory_pool().await;
        db::seed_admin(&pool, ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("seed admin");
        let admin_id = db::fetch_admin_by_email(&pool, ADMIN_EMAIL)
            .await
            .expect("query admin")
            .expect("admin seeded")
            .id;

        let uploads = tempfile::tempdir().expect("upload dir");
        let phones = Arc::new(FixedPhoneScreen::new(verdict));
        let state = AppState {
            db: pool,
            sessions: SessionKeys::new("test-secret"),
            uploads: UploadStore::new(uploads.path().join("uploads")),
            captcha: Arc::new(captcha),
            phones: phones.clone(),
            secure_cookies: false,
        };

        Self {
            state,
            phones,
            admin_id,
            _uploads: uploads,
        }
    }

    pub fn token(&self) -> String {
        self.state.sessions.issue(&self.admin_id).expect("issue token")
    }

    pub fn bearer(&self) -> (actix_web::http::header::HeaderName, String) {
        (
            actix_web::http::header::AUTHORIZATION,
            format!("Bearer {}", self.token()),
        )
    }

    /// Mounts the application routes with this environment's state.
    pub fn mount(&self) -> impl FnOnce(&mut web::ServiceConfig) {
        let state = self.state.clone();
        move |cfg| {
            cfg.app_data(web::Data::new(state));
            routes::configure(cfg);
        }
    }
}
