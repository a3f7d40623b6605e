use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::error::{ApiError, FieldIssue};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("phone pattern"));
static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern"));
static LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("letters pattern"));
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern")
});

/// Accumulates every failing field of a form before reporting.
#[derive(Debug, Default)]
pub struct Issues(Vec<FieldIssue>);

impl Issues {
    pub fn push(&mut self, path: &str, message: &str) {
        self.0.push(FieldIssue {
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    pub fn min_len(&mut self, path: &str, value: &str, min: usize, message: &str) -> bool {
        let ok = value.chars().count() >= min;
        if !ok {
            self.push(path, message);
        }
        ok
    }

    pub fn max_len(&mut self, path: &str, value: &str, max: usize, message: &str) -> bool {
        let ok = value.chars().count() <= max;
        if !ok {
            self.push(path, message);
        }
        ok
    }

    pub fn check(&mut self, path: &str, ok: bool, message: &str) -> bool {
        if !ok {
            self.push(path, message);
        }
        ok
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub fn is_phone(value: &str) -> bool {
    PHONE.is_match(value)
}

pub fn is_slug(value: &str) -> bool {
    SLUG.is_match(value)
}

pub fn is_letters_and_spaces(value: &str) -> bool {
    LETTERS.is_match(value)
}

pub fn is_clock_time(value: &str) -> bool {
    CLOCK_TIME.is_match(value)
}

/// Accepts a calendar date or a full RFC 3339 timestamp.
pub fn parse_birth_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Trims and drops blank values.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
