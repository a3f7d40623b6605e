use std::{fs, path::Path, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    QueryBuilder, Sqlite, SqlitePool,
};
use uuid::Uuid;

use crate::{
    auth::hash_password,
    listing::{contains_pattern, AppointmentSort, PageRequest, ReviewSort, ServiceSort, SortField, SortOrder},
    models::{AdminRow, AppointmentRow, AppointmentStatus, ReviewRow, ServiceRow},
};

/// Appointment columns joined with their service, shared by every appointment read.
pub const APPOINTMENT_SELECT: &str = r#"SELECT a.id, a.name, a.email, a.phone, a.service_id,
          a.date_of_birth, a.time_of_birth, a.place_of_birth, a.additional_notes,
          a.status, a.created_at, a.updated_at,
          s.title AS service_title, s.price AS service_price,
          s.currency AS service_currency, s.slug AS service_slug,
          s.image AS service_image
   FROM appointments a
   LEFT JOIN services s ON a.service_id = s.id"#;

pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fixed-width UTC timestamp; lexical order equals chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now() -> String {
    timestamp(Utc::now())
}

/// Lowercased copy stored in the `*_fold` search columns. SQLite `LIKE` only
/// folds ASCII, so accented text is matched against these instead.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Creates the first admin account when none exists.
pub async fn seed_admin(pool: &SqlitePool, email: &str, password: &str) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>("SELECT id FROM admins LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = now();

    sqlx::query(
        r#"INSERT INTO admins (id, email, password_hash, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(email)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    log::info!("Seeded admin account {email}");
    Ok(())
}

pub async fn fetch_admin_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(
        "SELECT id, email, password_hash, created_at, updated_at FROM admins WHERE email = ? LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_admin_by_id(pool: &SqlitePool, id: &str) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(
        "SELECT id, email, password_hash, created_at, updated_at FROM admins WHERE id = ? LIMIT 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_service_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!("{SERVICE_SELECT} WHERE id = ? LIMIT 1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_service_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!("{SERVICE_SELECT} WHERE slug = ? LIMIT 1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_appointment(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!("{APPOINTMENT_SELECT} WHERE a.id = ? LIMIT 1"))
        .bind(appointment_id)
        .fetch_optional(pool)
        .await
}

const SERVICE_SELECT: &str =
    "SELECT id, title, price, currency, image, slug, created_at, updated_at FROM services";
const REVIEW_SELECT: &str = "SELECT id, name, image, review, created_at, updated_at FROM reviews";
const APPOINTMENT_COUNT: &str =
    "SELECT COUNT(*) FROM appointments a LEFT JOIN services s ON a.service_id = s.id";

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub search: Option<String>,
}

fn push_search<'a>(builder: &mut QueryBuilder<'a, Sqlite>, columns: &[&str], term: Option<&str>) {
    let Some(term) = term else {
        return;
    };
    let pattern = contains_pattern(&fold(term));
    builder.push(" WHERE (");
    for (idx, column) in columns.iter().enumerate() {
        if idx > 0 {
            builder.push(" OR ");
        }
        builder
            .push(*column)
            .push(" LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\'");
    }
    builder.push(")");
}

fn push_order_and_page<'a, S: SortField>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    sort: S,
    order: SortOrder,
    tie_breaker: &str,
    page: PageRequest,
) {
    builder
        .push(" ORDER BY ")
        .push(sort.column())
        .push(" ")
        .push(order.sql())
        .push(", ")
        .push(tie_breaker)
        .push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

pub async fn list_services(
    pool: &SqlitePool,
    search: Option<&str>,
    sort: ServiceSort,
    order: SortOrder,
    page: PageRequest,
) -> Result<(Vec<ServiceRow>, i64), sqlx::Error> {
    const COLUMNS: [&str; 2] = ["title_fold", "slug"];

    let mut select = QueryBuilder::<Sqlite>::new(SERVICE_SELECT);
    push_search(&mut select, &COLUMNS, search);
    push_order_and_page(&mut select, sort, order, "id", page);
    let rows = select.build_query_as::<ServiceRow>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM services");
    push_search(&mut count, &COLUMNS, search);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((rows, total))
}

pub async fn list_reviews(
    pool: &SqlitePool,
    search: Option<&str>,
    sort: ReviewSort,
    order: SortOrder,
    page: PageRequest,
) -> Result<(Vec<ReviewRow>, i64), sqlx::Error> {
    const COLUMNS: [&str; 2] = ["name_fold", "review_fold"];

    let mut select = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
    push_search(&mut select, &COLUMNS, search);
    push_order_and_page(&mut select, sort, order, "id", page);
    let rows = select.build_query_as::<ReviewRow>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM reviews");
    push_search(&mut count, &COLUMNS, search);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((rows, total))
}

fn push_appointment_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &AppointmentFilter) {
    const COLUMNS: [&str; 5] = [
        "a.name_fold",
        "a.email_fold",
        "a.phone",
        "a.place_of_birth_fold",
        "s.title_fold",
    ];

    push_search(builder, &COLUMNS, filter.search.as_deref());
    if let Some(status) = filter.status {
        let joiner = if filter.search.is_some() { " AND " } else { " WHERE " };
        builder.push(joiner).push("a.status = ").push_bind(status.as_str());
    }
}

pub async fn list_appointments(
    pool: &SqlitePool,
    filter: &AppointmentFilter,
    sort: AppointmentSort,
    order: SortOrder,
    page: PageRequest,
) -> Result<(Vec<AppointmentRow>, i64), sqlx::Error> {
    let mut select = QueryBuilder::<Sqlite>::new(APPOINTMENT_SELECT);
    push_appointment_filter(&mut select, filter);
    push_order_and_page(&mut select, sort, order, "a.id", page);
    let rows = select.build_query_as::<AppointmentRow>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new(APPOINTMENT_COUNT);
    push_appointment_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((rows, total))
}
