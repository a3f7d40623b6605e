use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::ApiError,
    models::{AppointmentStatus, PageKind, DEFAULT_CURRENCY},
    validation::{
        clean, is_clock_time, is_email, is_letters_and_spaces, is_phone, is_slug,
        parse_birth_date, Issues,
    },
};

const NOTES_MAX: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ServiceForm {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub image: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub image: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub image: Option<String>,
    pub slug: Option<String>,
}

impl ServiceForm {
    pub fn into_new(self) -> Result<NewService, ApiError> {
        let mut issues = Issues::default();
        if self.title.is_none() {
            issues.push("title", "Title is required");
        }
        if self.price.is_none() {
            issues.push("price", "Price is required");
        }
        if self.slug.is_none() {
            issues.push("slug", "Slug is required");
        }
        let changes = self.checked(issues)?;

        Ok(NewService {
            title: changes.title.unwrap_or_default(),
            price: changes.price.unwrap_or_default(),
            currency: changes
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            image: changes.image.unwrap_or_default(),
            slug: changes.slug.unwrap_or_default(),
        })
    }

    pub fn into_changes(self) -> Result<ServiceChanges, ApiError> {
        self.checked(Issues::default())
    }

    fn checked(self, mut issues: Issues) -> Result<ServiceChanges, ApiError> {
        let title = self.title.map(|value| value.trim().to_string());
        if let Some(title) = &title {
            issues.min_len("title", title, 2, "Title must be at least 2 characters long");
            issues.max_len("title", title, 100, "Title must be less than 100 characters");
        }
        if let Some(price) = self.price {
            if issues.check("price", price > 0.0, "Price must be a positive number") {
                issues.check("price", price >= 0.01, "Price must be at least 0.01");
            }
        }
        let currency = self.currency.map(|value| value.trim().to_string());
        if let Some(currency) = &currency {
            issues.check(
                "currency",
                currency.chars().count() == 3,
                "Currency must be exactly 3 characters",
            );
        }
        let slug = self.slug.map(|value| value.trim().to_string());
        if let Some(slug) = &slug {
            issues.min_len("slug", slug, 2, "Slug must be at least 2 characters long");
            issues.max_len("slug", slug, 100, "Slug must be less than 100 characters");
            issues.check(
                "slug",
                is_slug(slug),
                "Slug can only contain lowercase letters, numbers, and hyphens",
            );
        }
        issues.finish()?;

        Ok(ServiceChanges {
            title,
            price: self.price,
            currency,
            image: self.image.map(|value| value.trim().to_string()),
            slug,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service_slug: Option<String>,
    pub date_of_birth: Option<String>,
    pub time_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_slug: String,
    pub date_of_birth: DateTime<Utc>,
    pub time_of_birth: String,
    pub place_of_birth: String,
    pub additional_notes: Option<String>,
}

impl BookingForm {
    pub fn into_booking(self) -> Result<NewBooking, ApiError> {
        let mut issues = Issues::default();

        let name = clean(self.name).unwrap_or_default();
        issues.min_len("name", &name, 2, "Name must be at least 2 characters");
        issues.max_len("name", &name, 100, "Name must be less than 100 characters");

        let email = clean(self.email).unwrap_or_default();
        issues.check("email", is_email(&email), "Please enter a valid email address");

        let phone = clean(self.phone).unwrap_or_default();
        if issues.min_len("phone", &phone, 10, "Phone number must be at least 10 digits") {
            issues.check("phone", is_phone(&phone), "Please enter a valid phone number");
        }

        let service_slug = clean(self.service_slug).unwrap_or_default();
        issues.min_len("serviceSlug", &service_slug, 1, "Please select a service");

        let date_of_birth = clean(self.date_of_birth)
            .and_then(|value| parse_birth_date(&value))
            .filter(|date| *date < Utc::now());
        if date_of_birth.is_none() {
            issues.push("dateOfBirth", "Please enter a valid date of birth");
        }

        let time_of_birth = clean(self.time_of_birth).unwrap_or_default();
        if issues.min_len("timeOfBirth", &time_of_birth, 1, "Time of birth is required") {
            issues.check(
                "timeOfBirth",
                is_clock_time(&time_of_birth),
                "Please enter time in HH:MM format",
            );
        }

        let place_of_birth = clean(self.place_of_birth).unwrap_or_default();
        issues.min_len("placeOfBirth", &place_of_birth, 2, "Place of birth is required");
        issues.max_len("placeOfBirth", &place_of_birth, 100, "Place of birth is too long");

        let additional_notes = clean(self.additional_notes);
        if let Some(notes) = &additional_notes {
            issues.max_len("additionalNotes", notes, NOTES_MAX, "Notes are too long");
        }

        issues.finish()?;
        let Some(date_of_birth) = date_of_birth else {
            return Err(ApiError::Internal("date of birth missing after validation".into()));
        };

        Ok(NewBooking {
            name,
            email,
            phone,
            service_slug,
            date_of_birth,
            time_of_birth,
            place_of_birth,
            additional_notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdateForm {
    pub status: Option<String>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub status: Option<AppointmentStatus>,
    pub additional_notes: Option<String>,
}

impl AppointmentUpdateForm {
    pub fn into_changes(self) -> Result<AppointmentChanges, ApiError> {
        let mut issues = Issues::default();
        let status = match self.status.as_deref().map(str::trim) {
            None => None,
            Some(value) => {
                let parsed = AppointmentStatus::parse(value);
                issues.check(
                    "status",
                    parsed.is_some(),
                    "Status must be one of pending, confirmed, completed, cancelled",
                );
                parsed
            }
        };
        let additional_notes = self.additional_notes.map(|notes| notes.trim().to_string());
        if let Some(notes) = &additional_notes {
            issues.max_len("additionalNotes", notes, NOTES_MAX, "Notes are too long");
        }
        issues.finish()?;

        Ok(AppointmentChanges {
            status,
            additional_notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    pub name: Option<String>,
    pub image: Option<String>,
    pub review: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub name: String,
    pub image: String,
    pub review: String,
}

impl ReviewForm {
    pub fn into_review(self) -> Result<NewReview, ApiError> {
        let mut issues = Issues::default();

        let name = clean(self.name).unwrap_or_default();
        issues.min_len("name", &name, 2, "Name must be at least 2 characters long");
        issues.max_len("name", &name, 50, "Name must be less than 50 characters");
        issues.check(
            "name",
            is_letters_and_spaces(&name),
            "Name can only contain letters and spaces",
        );

        let review = clean(self.review).unwrap_or_default();
        issues.min_len("review", &review, 10, "Review must be at least 10 characters long");
        issues.max_len("review", &review, 500, "Review must be less than 500 characters");

        issues.finish()?;
        Ok(NewReview {
            name,
            image: clean(self.image).unwrap_or_default(),
            review,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub full_name: Option<String>,
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub captcha_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub subject: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub captcha_token: String,
}

impl ContactForm {
    pub fn into_submission(self) -> Result<ContactSubmission, ApiError> {
        let mut issues = Issues::default();

        let name = clean(self.full_name).unwrap_or_default();
        issues.min_len("fullName", &name, 2, "Please enter your full name");
        let subject = clean(self.subject).unwrap_or_default();
        issues.min_len("subject", &subject, 2, "Please add a subject");
        let phone = clean(self.phone).unwrap_or_default();
        issues.min_len("phone", &phone, 10, "Phone Number must be at least 10 characters");
        let email = clean(self.email).unwrap_or_default();
        issues.check("email", is_email(&email), "Please enter a valid email address");
        let message = clean(self.message).unwrap_or_default();
        issues.min_len("message", &message, 10, "Message should be at least 10 characters");
        issues.finish()?;

        let captcha_token = clean(self.captcha_token)
            .ok_or_else(|| ApiError::BadRequest("Missing captcha token".to_string()))?;

        Ok(ContactSubmission {
            name,
            subject,
            phone,
            email,
            message,
            captcha_token,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactDetailsForm {
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ContactDetailsForm {
    /// Present fields are checked; absent fields keep their stored value.
    pub fn checked(self) -> Result<Self, ApiError> {
        let mut issues = Issues::default();
        let form = Self {
            phone1: self.phone1.map(|v| v.trim().to_string()),
            phone2: self.phone2.map(|v| v.trim().to_string()),
            whatsapp: self.whatsapp.map(|v| v.trim().to_string()),
            email: self.email.map(|v| v.trim().to_string()),
            address: self.address.map(|v| v.trim().to_string()),
        };
        for (path, value) in [
            ("phone1", &form.phone1),
            ("phone2", &form.phone2),
            ("whatsapp", &form.whatsapp),
        ] {
            if let Some(value) = value {
                issues.min_len(path, value, 10, "Must be at least 10 characters");
            }
        }
        if let Some(email) = &form.email {
            issues.check("email", is_email(email), "Please enter a valid email address");
        }
        if let Some(address) = &form.address {
            issues.min_len("address", address, 5, "Address must be at least 5 characters");
        }
        issues.finish()?;
        Ok(form)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageContent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: String,
}

impl PageForm {
    pub fn into_content(self, page: PageKind) -> Result<PageContent, ApiError> {
        let mut issues = Issues::default();
        let image = match self.image {
            Some(image) => image.trim().to_string(),
            None => {
                issues.push("image", "Image is required");
                String::new()
            }
        };

        if !page.has_text() {
            issues.finish()?;
            return Ok(PageContent {
                name: None,
                description: None,
                image,
            });
        }

        let name = self.name.map(|v| v.trim().to_string()).unwrap_or_default();
        issues.min_len("name", &name, 2, "Name must be at least 2 characters long");
        issues.max_len("name", &name, 50, "Name must be less than 50 characters");
        if page == PageKind::About {
            issues.check(
                "name",
                is_letters_and_spaces(&name),
                "Name can only contain letters and spaces",
            );
        }
        let description = self
            .description
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        issues.min_len(
            "description",
            &description,
            10,
            "Description must be at least 10 characters long",
        );
        issues.finish()?;

        Ok(PageContent {
            name: Some(name),
            description: Some(description),
            image,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    pub fn into_credentials(self) -> Result<(String, String), ApiError> {
        let mut issues = Issues::default();
        let email = clean(self.email).unwrap_or_default();
        issues.check("email", is_email(&email), "Please enter a valid email address");
        let password = self.password.unwrap_or_default();
        issues.min_len("password", &password, 8, "Password must be at least 8 characters");
        issues.finish()?;
        Ok((email, password))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl ChangePasswordForm {
    pub fn into_credentials(self) -> Result<(String, String), ApiError> {
        let mut issues = Issues::default();
        let email = clean(self.email).unwrap_or_default();
        issues.check("email", is_email(&email), "Please enter a valid email address");
        let password = self.password.unwrap_or_default();
        issues.min_len("password", &password, 8, "Password must be at least 8 characters long.");
        let confirm = self.confirm_password.unwrap_or_default();
        issues.min_len(
            "confirmPassword",
            &confirm,
            8,
            "Confirm password must be at least 8 characters long.",
        );
        if issues.is_empty() {
            issues.check("confirmPassword", password == confirm, "Passwords do not match");
        }
        issues.finish()?;
        Ok((email, password))
    }
}
