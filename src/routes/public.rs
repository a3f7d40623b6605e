use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    db::{self, fetch_appointment, fetch_service_by_slug, AppointmentFilter},
    error::ApiError,
    forms::{BookingForm, ReviewForm},
    listing::{AppointmentSort, ListQuery, SortOrder},
    models::{AppointmentStatus, AppointmentView, ReviewRow, ServiceRow},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/user/services").route(web::get().to(list_services)))
        .service(web::resource("/api/user/services/{slug}").route(web::get().to(service_by_slug)))
        .service(
            web::resource("/api/appointments")
                .route(web::get().to(list_appointments))
                .route(web::post().to(create_appointment)),
        )
        .service(
            web::resource("/api/reviews")
                .route(web::get().to(list_reviews))
                .route(web::post().to(create_review)),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let services = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, title, price, currency, image, slug, created_at, updated_at
           FROM services ORDER BY created_at DESC, id"#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "services": services })))
}

async fn service_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let service = fetch_service_by_slug(&state.db, path.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "service": service })))
}

async fn create_appointment(
    state: web::Data<AppState>,
    form: web::Json<BookingForm>,
) -> Result<HttpResponse, ApiError> {
    let booking = form.into_inner().into_booking()?;
    let service = fetch_service_by_slug(&state.db, &booking.service_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    let id = db::new_id();
    let now = db::now();
    sqlx::query(
        r#"INSERT INTO appointments
           (id, name, email, phone, service_id, date_of_birth, time_of_birth,
            place_of_birth, additional_notes, status, created_at, updated_at,
            name_fold, email_fold, place_of_birth_fold)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&booking.name)
    .bind(&booking.email)
    .bind(&booking.phone)
    .bind(&service.id)
    .bind(db::timestamp(booking.date_of_birth))
    .bind(&booking.time_of_birth)
    .bind(&booking.place_of_birth)
    .bind(&booking.additional_notes)
    .bind(AppointmentStatus::Pending.as_str())
    .bind(&now)
    .bind(&now)
    .bind(db::fold(&booking.name))
    .bind(db::fold(&booking.email))
    .bind(db::fold(&booking.place_of_birth))
    .execute(&state.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            ApiError::not_found("Service")
        }
        _ => ApiError::Database(err),
    })?;

    let appointment = fetch_appointment(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("appointment {id} missing after insert")))?;
    log::info!("New appointment {id} for service {}", service.slug);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Appointment created successfully",
        "appointment": AppointmentView::from(appointment),
    })))
}

async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page_request();
    let filter = AppointmentFilter {
        status: query.status.as_deref().and_then(AppointmentStatus::parse),
        search: None,
    };
    let (rows, total) = db::list_appointments(
        &state.db,
        &filter,
        AppointmentSort::CreatedAt,
        SortOrder::Desc,
        page,
    )
    .await?;
    let appointments: Vec<AppointmentView> = rows.into_iter().map(AppointmentView::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "appointments": appointments,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": total,
            "pages": (total + page.limit - 1) / page.limit,
        },
    })))
}

async fn create_review(
    state: web::Data<AppState>,
    form: web::Json<ReviewForm>,
) -> Result<HttpResponse, ApiError> {
    let review = form.into_inner().into_review()?;
    let id = db::new_id();
    let now = db::now();

    let row = sqlx::query_as::<_, ReviewRow>(
        r#"INSERT INTO reviews
           (id, name, image, review, created_at, updated_at, name_fold, review_fold)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING id, name, image, review, created_at, updated_at"#,
    )
    .bind(&id)
    .bind(&review.name)
    .bind(&review.image)
    .bind(&review.review)
    .bind(&now)
    .bind(&now)
    .bind(db::fold(&review.name))
    .bind(db::fold(&review.review))
    .fetch_one(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Review submitted successfully",
        "review": row,
    })))
}

async fn list_reviews(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reviews = sqlx::query_as::<_, ReviewRow>(
        r#"SELECT id, name, image, review, created_at, updated_at
           FROM reviews ORDER BY created_at DESC, id"#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "reviews": reviews })))
}
