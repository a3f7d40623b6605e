use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Raw list query string; values are parsed leniently and fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.as_deref(), self.limit.as_deref())
    }

    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn sort<S: SortField>(&self) -> (S, SortOrder) {
        let field = self
            .sort_by
            .as_deref()
            .and_then(S::parse)
            .unwrap_or(S::DEFAULT);
        let order = self
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(SortOrder::Desc);
        (field, order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value >= 1)
            .unwrap_or(1);
        let limit = limit
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_count: i64) -> Self {
        let total_pages = (total_count + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_count,
            limit: request.limit,
            has_next_page: request.page < total_pages,
            has_previous_page: request.page > 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A closed set of sortable columns for one list view.
pub trait SortField: Copy {
    const DEFAULT: Self;

    fn parse(value: &str) -> Option<Self>;
    fn as_str(self) -> &'static str;
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSort {
    CreatedAt,
    UpdatedAt,
    Title,
    Price,
}

impl SortField for ServiceSort {
    const DEFAULT: Self = ServiceSort::CreatedAt;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(ServiceSort::CreatedAt),
            "updatedAt" => Some(ServiceSort::UpdatedAt),
            "title" => Some(ServiceSort::Title),
            "price" => Some(ServiceSort::Price),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ServiceSort::CreatedAt => "createdAt",
            ServiceSort::UpdatedAt => "updatedAt",
            ServiceSort::Title => "title",
            ServiceSort::Price => "price",
        }
    }

    fn column(self) -> &'static str {
        match self {
            ServiceSort::CreatedAt => "created_at",
            ServiceSort::UpdatedAt => "updated_at",
            ServiceSort::Title => "title",
            ServiceSort::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSort {
    CreatedAt,
    UpdatedAt,
    Name,
}

impl SortField for ReviewSort {
    const DEFAULT: Self = ReviewSort::CreatedAt;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(ReviewSort::CreatedAt),
            "updatedAt" => Some(ReviewSort::UpdatedAt),
            "name" => Some(ReviewSort::Name),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ReviewSort::CreatedAt => "createdAt",
            ReviewSort::UpdatedAt => "updatedAt",
            ReviewSort::Name => "name",
        }
    }

    fn column(self) -> &'static str {
        match self {
            ReviewSort::CreatedAt => "created_at",
            ReviewSort::UpdatedAt => "updated_at",
            ReviewSort::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentSort {
    CreatedAt,
    UpdatedAt,
    Name,
    Email,
    Status,
    Service,
}

impl SortField for AppointmentSort {
    const DEFAULT: Self = AppointmentSort::CreatedAt;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(AppointmentSort::CreatedAt),
            "updatedAt" => Some(AppointmentSort::UpdatedAt),
            "name" => Some(AppointmentSort::Name),
            "email" => Some(AppointmentSort::Email),
            "status" => Some(AppointmentSort::Status),
            "service" => Some(AppointmentSort::Service),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AppointmentSort::CreatedAt => "createdAt",
            AppointmentSort::UpdatedAt => "updatedAt",
            AppointmentSort::Name => "name",
            AppointmentSort::Email => "email",
            AppointmentSort::Status => "status",
            AppointmentSort::Service => "service",
        }
    }

    fn column(self) -> &'static str {
        match self {
            AppointmentSort::CreatedAt => "a.created_at",
            AppointmentSort::UpdatedAt => "a.updated_at",
            AppointmentSort::Name => "a.name",
            AppointmentSort::Email => "a.email",
            AppointmentSort::Status => "a.status",
            AppointmentSort::Service => "s.title",
        }
    }
}

/// Builds a `LIKE` pattern matching `term` anywhere, escaping wildcards with `\`.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
