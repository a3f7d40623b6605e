use serde::Serialize;

pub const DEFAULT_CURRENCY: &str = "CAD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRow {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub image: String,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Appointment joined with the columns of its service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_id: String,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub place_of_birth: String,
    pub additional_notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub service_title: Option<String>,
    pub service_price: Option<f64>,
    pub service_currency: Option<String>,
    pub service_slug: Option<String>,
    pub service_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub slug: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_id: String,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub place_of_birth: String,
    pub additional_notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub service: Option<ServiceSummary>,
}

impl From<AppointmentRow> for AppointmentView {
    fn from(row: AppointmentRow) -> Self {
        let service = match (row.service_title, row.service_slug) {
            (Some(title), Some(slug)) => Some(ServiceSummary {
                id: row.service_id.clone(),
                title,
                price: row.service_price.unwrap_or_default(),
                currency: row
                    .service_currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                slug,
                image: row.service_image.unwrap_or_default(),
            }),
            _ => None,
        };

        AppointmentView {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            service_id: row.service_id,
            date_of_birth: row.date_of_birth,
            time_of_birth: row.time_of_birth,
            place_of_birth: row.place_of_birth,
            additional_notes: row.additional_notes,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            service,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub id: String,
    pub name: String,
    pub image: String,
    pub review: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetailsRow {
    pub id: String,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PageContentRow {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The editable site pages, each stored as exactly one row keyed by its slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    About,
    Astrology,
    FaceReading,
    KundaliDosha,
    Vastu,
    PayNow,
}

impl PageKind {
    pub const ALL: [PageKind; 6] = [
        PageKind::About,
        PageKind::Astrology,
        PageKind::FaceReading,
        PageKind::KundaliDosha,
        PageKind::Vastu,
        PageKind::PayNow,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            PageKind::About => "about",
            PageKind::Astrology => "astrology",
            PageKind::FaceReading => "face-reading",
            PageKind::KundaliDosha => "kundali-dosha",
            PageKind::Vastu => "vastu",
            PageKind::PayNow => "paynow",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.slug() == slug)
    }

    /// Key used for the page in public read responses.
    pub fn public_key(self) -> &'static str {
        match self {
            PageKind::About => "about",
            PageKind::Astrology => "astrology",
            PageKind::FaceReading => "faceReading",
            PageKind::KundaliDosha => "kundaliDosha",
            PageKind::Vastu => "vastu",
            PageKind::PayNow => "payment",
        }
    }

    pub fn has_text(self) -> bool {
        self != PageKind::PayNow
    }
}
