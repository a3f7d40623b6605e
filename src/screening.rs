//! Anti-abuse checks run before a contact message is stored.
//!
//! The captcha check always runs first; the phone risk lookup is billed per
//! request and only runs for submissions that already passed it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::ApiError;

pub const MIN_CAPTCHA_SCORE: f64 = 0.5;
pub const HIGH_RISK_FRAUD_SCORE: f64 = 85.0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaOutcome {
    #[serde(default)]
    pub success: bool,
    pub score: Option<f64>,
}

impl CaptchaOutcome {
    pub fn passes(&self) -> bool {
        self.success && self.score.map_or(true, |score| score >= MIN_CAPTCHA_SCORE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhoneVerdict {
    Clear,
    /// The risk service could not be consulted; the submission goes through.
    Unchecked,
    Invalid(String),
    HighRisk,
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CaptchaOutcome, ScreeningError>;
}

#[async_trait]
pub trait PhoneScreen: Send + Sync {
    async fn screen(&self, phone: &str) -> PhoneVerdict;
}

pub struct RecaptchaVerifier {
    client: Client,
    endpoint: String,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(endpoint: String, secret: String) -> Result<Self, ScreeningError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint,
            secret,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<CaptchaOutcome, ScreeningError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScreeningError::Status(response.status().as_u16()));
        }
        Ok(response.json::<CaptchaOutcome>().await?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneReport {
    #[serde(default)]
    pub valid: bool,
    pub fraud_score: Option<f64>,
    pub message: Option<String>,
}

impl PhoneReport {
    pub fn verdict(&self) -> PhoneVerdict {
        if !self.valid {
            let message = self
                .message
                .clone()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| "Invalid phone number".to_string());
            return PhoneVerdict::Invalid(message);
        }
        match self.fraud_score {
            Some(score) if score >= HIGH_RISK_FRAUD_SCORE => PhoneVerdict::HighRisk,
            _ => PhoneVerdict::Clear,
        }
    }
}

pub struct IpqsPhoneScreen {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl IpqsPhoneScreen {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, ScreeningError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url,
            api_key,
        })
    }

    fn lookup_url(&self, api_key: &str, phone: &str) -> Result<Url, ScreeningError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ScreeningError::Endpoint(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ScreeningError::Endpoint(self.base_url.clone()))?
            .pop_if_empty()
            .push(api_key)
            .push(phone);
        url.query_pairs_mut()
            .append_pair("strictness", "1")
            .append_pair("line_type", "true");
        Ok(url)
    }

    async fn lookup(&self, api_key: &str, phone: &str) -> Result<PhoneReport, ScreeningError> {
        let response = self.client.get(self.lookup_url(api_key, phone)?).send().await?;
        if !response.status().is_success() {
            return Err(ScreeningError::Status(response.status().as_u16()));
        }
        Ok(response.json::<PhoneReport>().await?)
    }
}

#[async_trait]
impl PhoneScreen for IpqsPhoneScreen {
    async fn screen(&self, phone: &str) -> PhoneVerdict {
        let Some(api_key) = self.api_key.as_deref() else {
            return PhoneVerdict::Unchecked;
        };
        match self.lookup(api_key, phone).await {
            Ok(report) => report.verdict(),
            Err(err) => {
                log::warn!("Phone risk lookup unavailable, letting submission through: {err}");
                PhoneVerdict::Unchecked
            }
        }
    }
}

/// Runs both gates in order; `Ok` means the submission may be stored.
pub async fn screen_contact(
    captcha: &dyn CaptchaVerifier,
    phones: &dyn PhoneScreen,
    captcha_token: &str,
    phone: &str,
) -> Result<(), ApiError> {
    let outcome = captcha
        .verify(captcha_token)
        .await
        .map_err(|err| ApiError::Internal(format!("captcha verification error: {err}")))?;
    if !outcome.passes() {
        return Err(ApiError::Rejected {
            message: "reCAPTCHA verification failed".to_string(),
            code: "captcha_failed",
        });
    }

    match phones.screen(phone).await {
        PhoneVerdict::Clear | PhoneVerdict::Unchecked => Ok(()),
        PhoneVerdict::Invalid(message) => Err(ApiError::Rejected {
            message,
            code: "invalid",
        }),
        PhoneVerdict::HighRisk => Err(ApiError::Rejected {
            message: "High risk phone number".to_string(),
            code: "high_risk",
        }),
    }
}
