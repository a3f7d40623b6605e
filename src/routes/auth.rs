use actix_web::{http::header, middleware::from_fn, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::{
    auth::{
        admin_guard, expired_session_cookie, hash_password, session_cookie, token_from_request,
        verify_password, AdminSession,
    },
    db::{self, fetch_admin_by_email, fetch_admin_by_id},
    error::ApiError,
    forms::{ChangePasswordForm, LoginForm},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/auth")
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/me").route(web::get().to(me)))
            .service(
                web::resource("/change-password")
                    .wrap(from_fn(admin_guard))
                    .route(web::post().to(change_password)),
            )
            .service(web::resource("/logout").route(web::post().to(logout))),
    );
}

async fn login(
    state: web::Data<AppState>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let (email, password) = form.into_inner().into_credentials()?;
    let admin = fetch_admin_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin"))?;

    if !verify_password(&password, &admin.password_hash) {
        log::warn!("Failed admin login for {email}");
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let token = state.sessions.issue(&admin.id)?;
    log::info!("Admin {} signed in", admin.id);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&token, state.secure_cookies))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(json!({ "success": true, "token": token })))
}

async fn me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let token = token_from_request(&req)
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;
    let session = state
        .sessions
        .verify(&token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    let admin = fetch_admin_by_id(&state.db, &session.admin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin"))?;

    Ok(HttpResponse::Ok().json(json!({
        "id": admin.id,
        "email": admin.email,
        "createdAt": admin.created_at,
        "updatedAt": admin.updated_at,
    })))
}

async fn change_password(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Json<ChangePasswordForm>,
) -> Result<HttpResponse, ApiError> {
    let (email, password) = form.into_inner().into_credentials()?;
    let admin = fetch_admin_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin"))?;

    let password_hash = hash_password(&password)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;
    sqlx::query("UPDATE admins SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(db::now())
        .bind(&admin.id)
        .execute(&state.db)
        .await?;

    log::info!("Admin {} changed the password of {}", session.admin_id, admin.id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(expired_session_cookie(state.secure_cookies))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(json!({ "success": true }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::{
        auth::SESSION_COOKIE,
        test_support::{TestEnv, ADMIN_EMAIL, ADMIN_PASSWORD},
    };

    #[actix_web::test]
    async fn login_sets_session_cookie() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .expect("session cookie set");
        assert_eq!(cookie.http_only(), Some(true));

        let req = test::TestRequest::get()
            .uri("/api/admin/auth/me")
            .cookie(cookie.into_owned())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["email"], ADMIN_EMAIL);
        assert_eq!(body["id"], env.admin_id);
    }

    #[actix_web::test]
    async fn login_failures_are_distinguished() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({ "email": "nobody@example.com", "password": ADMIN_PASSWORD }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid password");
    }

    #[actix_web::test]
    async fn me_rejects_missing_and_forged_tokens() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let req = test::TestRequest::get().uri("/api/admin/auth/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let forged = crate::auth::SessionKeys::new("other-secret")
            .issue(&env.admin_id)
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/api/admin/auth/me")
            .insert_header(("Authorization", format!("Bearer {forged}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[actix_web::test]
    async fn change_password_rotates_credentials() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;

        let change = json!({
            "email": ADMIN_EMAIL,
            "password": "brand-new-secret",
            "confirmPassword": "brand-new-secret",
        });
        let req = test::TestRequest::post()
            .uri("/api/admin/auth/change-password")
            .set_json(&change)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/change-password")
            .insert_header(env.bearer())
            .set_json(&change)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": "brand-new-secret" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn logout_expires_cookie() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(env.mount())).await;
        let req = test::TestRequest::post().uri("/api/admin/auth/logout").to_request();
        let res = test::call_service(&app, req).await;
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .expect("cookie cleared");
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.max_age(),
            Some(actix_web::cookie::time::Duration::seconds(0))
        );
    }
}
