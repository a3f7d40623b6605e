use actix_web::{middleware::from_fn, web, HttpResponse};
use serde_json::json;

use crate::{
    auth::{admin_guard, AdminSession},
    db::{self, fetch_appointment, fetch_service_by_id, fetch_service_by_slug, AppointmentFilter},
    error::{conflict_on_unique, ApiError, FieldIssue},
    forms::{AppointmentUpdateForm, ServiceForm},
    listing::{AppointmentSort, ListQuery, Pagination, ReviewSort, ServiceSort, SortField},
    models::{AppointmentStatus, AppointmentView, ReviewRow, ServiceRow},
    state::AppState,
};

const DUPLICATE_SLUG: &str = "A service with this slug already exists";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/services")
            .wrap(from_fn(admin_guard))
            .route(web::get().to(list_services))
            .route(web::post().to(create_service)),
    )
    .service(
        web::resource("/api/admin/services/{id}")
            .wrap(from_fn(admin_guard))
            .route(web::get().to(service_detail))
            .route(web::put().to(update_service))
            .route(web::delete().to(delete_service)),
    )
    .service(
        web::resource("/api/admin/appointments")
            .wrap(from_fn(admin_guard))
            .route(web::get().to(list_appointments)),
    )
    .service(
        web::resource("/api/admin/appointments/{id}")
            .wrap(from_fn(admin_guard))
            .route(web::get().to(appointment_detail))
            .route(web::put().to(update_appointment))
            .route(web::delete().to(delete_appointment)),
    )
    .service(
        web::resource("/api/admin/reviews")
            .wrap(from_fn(admin_guard))
            .route(web::get().to(list_reviews)),
    )
    .service(
        web::resource("/api/admin/reviews/{id}")
            .wrap(from_fn(admin_guard))
            .route(web::delete().to(delete_review)),
    );
}

async fn list_services(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page_request();
    let search = query.search_term();
    let (sort, order) = query.sort::<ServiceSort>();

    let (services, total) =
        db::list_services(&state.db, search.as_deref(), sort, order, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "services": services,
        "pagination": Pagination::new(page, total),
        "filters": {
            "search": search.unwrap_or_default(),
            "sortBy": sort.as_str(),
            "sortOrder": order.as_str(),
        },
    })))
}

async fn create_service(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Json<ServiceForm>,
) -> Result<HttpResponse, ApiError> {
    let service = form.into_inner().into_new()?;
    if fetch_service_by_slug(&state.db, &service.slug).await?.is_some() {
        return Err(ApiError::Conflict(DUPLICATE_SLUG.to_string()));
    }

    let now = db::now();
    let row = sqlx::query_as::<_, ServiceRow>(
        r#"INSERT INTO services
           (id, title, price, currency, image, slug, created_at, updated_at, title_fold)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING id, title, price, currency, image, slug, created_at, updated_at"#,
    )
    .bind(db::new_id())
    .bind(&service.title)
    .bind(service.price)
    .bind(&service.currency)
    .bind(&service.image)
    .bind(&service.slug)
    .bind(&now)
    .bind(&now)
    .bind(db::fold(&service.title))
    .fetch_one(&state.db)
    .await
    .map_err(|err| conflict_on_unique(err, DUPLICATE_SLUG))?;

    log::info!("Admin {} created service {}", session.admin_id, row.slug);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Service created successfully",
        "service": row,
    })))
}

async fn service_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let service = fetch_service_by_id(&state.db, &path)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "service": service })))
}

async fn update_service(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
    form: web::Json<ServiceForm>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let changes = form.into_inner().into_changes()?;
    let existing = fetch_service_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    if let Some(slug) = changes.slug.as_deref().filter(|slug| *slug != existing.slug) {
        if fetch_service_by_slug(&state.db, slug).await?.is_some() {
            return Err(ApiError::Conflict(DUPLICATE_SLUG.to_string()));
        }
    }

    let row = sqlx::query_as::<_, ServiceRow>(
        r#"UPDATE services
           SET title = COALESCE(?, title),
               price = COALESCE(?, price),
               currency = COALESCE(?, currency),
               image = COALESCE(?, image),
               slug = COALESCE(?, slug),
               title_fold = COALESCE(?, title_fold),
               updated_at = ?
           WHERE id = ?
           RETURNING id, title, price, currency, image, slug, created_at, updated_at"#,
    )
    .bind(&changes.title)
    .bind(changes.price)
    .bind(&changes.currency)
    .bind(&changes.image)
    .bind(&changes.slug)
    .bind(changes.title.as_deref().map(db::fold))
    .bind(db::now())
    .bind(&id)
    .fetch_optional(&state.db)
    .await
    .map_err(|err| conflict_on_unique(err, DUPLICATE_SLUG))?
    .ok_or_else(|| ApiError::not_found("Service"))?;

    log::info!("Admin {} updated service {}", session.admin_id, row.id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Service updated successfully",
        "service": row,
    })))
}

async fn delete_service(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let service = fetch_service_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    let booked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE service_id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;
    if booked > 0 {
        return Err(ApiError::Conflict(format!(
            "Cannot delete a service with {booked} appointment(s)"
        )));
    }

    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ApiError::Conflict("Cannot delete a service that has appointments".to_string())
            }
            _ => ApiError::Database(err),
        })?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Service"));
    }

    state.uploads.discard(&service.image).await;
    log::info!("Admin {} deleted service {}", session.admin_id, service.slug);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Service deleted successfully",
        "deletedService": service,
    })))
}

/// `all` or an empty value means no status filter.
fn status_filter(raw: Option<&str>) -> Result<Option<AppointmentStatus>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => AppointmentStatus::parse(value).map(Some).ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue {
                path: "status".to_string(),
                message: format!("Unknown status '{value}'"),
            }])
        }),
    }
}

async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page_request();
    let (sort, order) = query.sort::<AppointmentSort>();
    let filter = AppointmentFilter {
        status: status_filter(query.status.as_deref())?,
        search: query.search_term(),
    };

    let (rows, total) = db::list_appointments(&state.db, &filter, sort, order, page).await?;
    let appointments: Vec<AppointmentView> = rows.into_iter().map(AppointmentView::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "appointments": appointments,
        "pagination": Pagination::new(page, total),
        "filters": {
            "status": filter.status.map_or("all", AppointmentStatus::as_str),
            "search": filter.search.unwrap_or_default(),
            "sortBy": sort.as_str(),
            "sortOrder": order.as_str(),
        },
    })))
}

async fn appointment_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let appointment = fetch_appointment(&state.db, &path)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment),
    })))
}

async fn update_appointment(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
    form: web::Json<AppointmentUpdateForm>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let changes = form.into_inner().into_changes()?;

    let result = sqlx::query(
        r#"UPDATE appointments
           SET status = COALESCE(?, status),
               additional_notes = COALESCE(?, additional_notes),
               updated_at = ?
           WHERE id = ?"#,
    )
    .bind(changes.status.map(AppointmentStatus::as_str))
    .bind(&changes.additional_notes)
    .bind(db::now())
    .bind(&id)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Appointment"));
    }

    let appointment = fetch_appointment(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment"))?;
    log::info!(
        "Admin {} updated appointment {id} (status {})",
        session.admin_id,
        appointment.status
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Appointment updated successfully",
        "appointment": AppointmentView::from(appointment),
    })))
}

async fn delete_appointment(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Appointment"));
    }

    log::info!("Admin {} deleted appointment {id}", session.admin_id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Appointment deleted successfully",
    })))
}

async fn list_reviews(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page_request();
    let search = query.search_term();
    let (sort, order) = query.sort::<ReviewSort>();

    let (reviews, total) =
        db::list_reviews(&state.db, search.as_deref(), sort, order, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "reviews": reviews,
        "pagination": Pagination::new(page, total),
        "filters": {
            "search": search.unwrap_or_default(),
            "sortBy": sort.as_str(),
            "sortOrder": order.as_str(),
        },
    })))
}

async fn delete_review(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let review = sqlx::query_as::<_, ReviewRow>(
        r#"DELETE FROM reviews WHERE id = ?
           RETURNING id, name, image, review, created_at, updated_at"#,
    )
    .bind(path.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Review"))?;

    state.uploads.discard(&review.image).await;
    log::info!("Admin {} deleted review {}", session.admin_id, review.id);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Review deleted successfully",
        "deletedReview": review,
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::test_support::TestEnv;

    fn service(slug: &str) -> Value {
        json!({
            "title": "Face Reading",
            "price": 50.0,
            "currency": "CAD",
            "slug": slug,
        })
    }

    #[actix_web::test]
    async fn admin_routes_require_a_session() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        for uri in ["/api/admin/services", "/api/admin/appointments", "/api/admin/reviews"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/services")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn duplicate_slug_conflicts_and_keeps_one_row() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(service("face-reading-basic"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["service"]["slug"], "face-reading-basic");
        assert_eq!(body["service"]["price"], 50.0);

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(service("face-reading-basic"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services WHERE slug = ?")
            .bind("face-reading-basic")
            .fetch_one(&env.state.db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn third_page_of_twenty_five_services() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;
        for idx in 0..25 {
            let req = test::TestRequest::post()
                .uri("/api/admin/services")
                .insert_header(env.bearer())
                .set_json(service(&format!("service-{idx:02}")))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/services?page=3&limit=10&sortBy=title&sortOrder=asc")
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["services"].as_array().unwrap().len(), 5);
        assert_eq!(body["pagination"]["totalCount"], 25);
        assert_eq!(body["pagination"]["hasNextPage"], false);
        assert_eq!(body["pagination"]["hasPreviousPage"], true);
        assert_eq!(body["filters"]["sortBy"], "title");

        let req = test::TestRequest::get()
            .uri("/api/admin/services?search=service-1&sortBy=drop%20table")
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["totalCount"], 10);
        assert_eq!(body["filters"]["sortBy"], "createdAt");
        assert_eq!(body["filters"]["sortOrder"], "desc");
    }

    #[actix_web::test]
    async fn booking_lifecycle() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(service("face-reading-basic"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/appointments")
            .set_json(json!({
                "name": "Asha Rao",
                "email": "asha@example.com",
                "phone": "4165550199",
                "serviceSlug": "face-reading-basic",
                "dateOfBirth": "1990-01-01",
                "timeOfBirth": "14:30",
                "placeOfBirth": "Toronto",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["appointment"]["status"], "pending");
        let id = body["appointment"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/admin/appointments/{id}");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(env.bearer())
            .set_json(json!({ "status": "confirmed" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["appointment"]["status"], "confirmed");

        let req = test::TestRequest::get()
            .uri("/api/admin/appointments?status=confirmed&search=asha")
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["totalCount"], 1);
        assert_eq!(body["filters"]["status"], "confirmed");

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(env.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(env.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/admin/appointments")
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["totalCount"], 0);
    }

    #[actix_web::test]
    async fn unknown_status_filter_is_rejected() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;
        let req = test::TestRequest::get()
            .uri("/api/admin/appointments?status=accepted")
            .insert_header(env.bearer())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn booked_service_cannot_be_deleted() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(service("vastu-consult"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let service_id = body["service"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/appointments")
            .set_json(json!({
                "name": "Ravi Shah",
                "email": "ravi@example.com",
                "phone": "4165550100",
                "serviceSlug": "vastu-consult",
                "dateOfBirth": "1985-06-15",
                "timeOfBirth": "09:05",
                "placeOfBirth": "Mumbai",
            }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/services/{service_id}"))
            .insert_header(env.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn service_update_keeps_absent_fields() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        for slug in ["astro-chart", "palm-reading"] {
            let req = test::TestRequest::post()
                .uri("/api/admin/services")
                .insert_header(env.bearer())
                .set_json(service(slug))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }
        let id: String = sqlx::query_scalar("SELECT id FROM services WHERE slug = 'astro-chart'")
            .fetch_one(&env.state.db)
            .await
            .unwrap();
        let uri = format!("/api/admin/services/{id}");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(env.bearer())
            .set_json(json!({ "price": 75.5 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["service"]["price"], 75.5);
        assert_eq!(body["service"]["title"], "Face Reading");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(env.bearer())
            .set_json(json!({ "slug": "palm-reading" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn review_delete_removes_uploaded_image() {
        let env = TestEnv::new().await;
        let stored = env
            .state
            .uploads
            .store("face.png", "image/png", b"png")
            .await
            .unwrap();
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .set_json(json!({
                "name": "Meera Iyer",
                "image": stored.url,
                "review": "Clear guidance and a calm session.",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["review"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/reviews/{id}"))
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["deletedReview"]["name"], "Meera Iyer");
        assert!(!env.state.uploads.root().join(&stored.name).exists());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/reviews/{id}"))
            .insert_header(env.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn service_delete_removes_uploaded_image() {
        let env = TestEnv::new().await;
        let stored = env
            .state
            .uploads
            .store("chart.png", "image/png", b"png")
            .await
            .unwrap();
        let app = test::init_service(App::new().configure(env.mount())).await;

        let mut payload = service("birth-chart");
        payload["image"] = json!(stored.url);
        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/admin/services/{}", body["service"]["id"].as_str().unwrap());

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(env.bearer())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["deletedService"]["slug"], "birth-chart");
        assert!(!env.state.uploads.root().join(&stored.name).exists());

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(env.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn search_ignores_case_of_accented_letters() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let mut payload = service("etude-vedique");
        payload["title"] = json!("Étude Basique");
        let req = test::TestRequest::post()
            .uri("/api/admin/services")
            .insert_header(env.bearer())
            .set_json(payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/admin/services/{}", body["service"]["id"].as_str().unwrap());

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(env.bearer())
            .set_json(json!({ "title": "ÉTUDE Védique" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        for (term, expected) in [("étude", 1), ("VÉDIQUE", 1), ("basique", 0)] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/admin/services?search={}", encode(term)))
                .insert_header(env.bearer())
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["pagination"]["totalCount"], expected, "{term}");
        }

        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .set_json(json!({
                "name": "Emile Roy",
                "review": "Une lecture très précise.",
            }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/reviews?search={}", encode("TRÈS précise")))
            .insert_header(env.bearer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["totalCount"], 1);
    }

    fn encode(term: &str) -> String {
        term.bytes()
            .map(|byte| match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => (byte as char).to_string(),
                _ => format!("%{byte:02X}"),
            })
            .collect()
    }

    #[actix_web::test]
    async fn session_for_missing_admin_is_not_found() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let token = env.state.sessions.issue("removed-admin").unwrap();
        let req = test::TestRequest::get()
            .uri("/api/admin/services")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Admin not found");
    }
}
