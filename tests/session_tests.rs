use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tower::ServiceExt;
use wigtopia::api::AppState;
use wigtopia::config::Config;

async fn spawn_app_with(
    mutate: impl FnOnce(&mut Config),
) -> (Router, Arc<AppState>, tempfile::TempDir) {
    let uploads_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.server.secure_cookies = false;
    config.uploads.uploads_path = uploads_dir.path().to_string_lossy().to_string();
    mutate(&mut config);

    let state = wigtopia::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    (wigtopia::api::router(state.clone()), state, uploads_dir)
}

async fn spawn_app() -> (Router, Arc<AppState>, tempfile::TempDir) {
    spawn_app_with(|_| {}).await
}

fn cookies_named(response: &axum::response::Response, name: &str) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with(&format!("{name}=")))
        .map(ToString::to_string)
        .collect()
}

fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn seed_shopper(state: &AppState, email: &str, password: &str) -> i32 {
    let hash = wigtopia::db::repositories::admin::hash_password(password, None).unwrap();

    let user = wigtopia::entities::users::ActiveModel {
        name: Set("Ada".to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        address: Set(None),
        password_hash: Set(hash),
        remember_token: Set(None),
        remember_token_expires: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&state.store().conn)
    .await
    .unwrap();

    user.id
}

async fn shop_login(app: &Router, email: &str, password: &str, remember: bool) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/shop/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": email,
                        "password": password,
                        "remember": remember,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn shopper_login_and_me() {
    let (app, state, _dir) = spawn_app().await;
    seed_shopper(&state, "ada@example.com", "sup3rsecret").await;

    let response = shop_login(&app, "ada@example.com", "sup3rsecret", false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let session = cookie_pair(&cookies_named(&response, "id")[0]);
    // No remember cookie unless asked for.
    assert!(cookies_named(&response, "wigtopia_remember").is_empty());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn remember_me_restores_a_fresh_session() {
    let (app, state, _dir) = spawn_app().await;
    let user_id = seed_shopper(&state, "ada@example.com", "sup3rsecret").await;

    let response = shop_login(&app, "ada@example.com", "sup3rsecret", true).await;
    assert_eq!(response.status(), StatusCode::OK);

    let remember = cookie_pair(&cookies_named(&response, "wigtopia_remember")[0]);

    // A brand-new browser session carrying only the remember cookie.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &remember)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], user_id);
}

#[tokio::test]
async fn expired_remember_token_clears_cookie_without_redirect() {
    let (app, state, _dir) = spawn_app().await;
    seed_shopper(&state, "ada@example.com", "sup3rsecret").await;

    let response = shop_login(&app, "ada@example.com", "sup3rsecret", true).await;
    let remember = cookie_pair(&cookies_named(&response, "wigtopia_remember")[0]);

    // Expire the stored token behind the cookie's back.
    let user = wigtopia::entities::users::Entity::find()
        .filter(wigtopia::entities::users::Column::Email.eq("ada@example.com"))
        .one(&state.store().conn)
        .await
        .unwrap()
        .unwrap();
    let mut active: wigtopia::entities::users::ActiveModel = user.into();
    active.remember_token_expires =
        Set(Some((chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339()));
    active.update(&state.store().conn).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &remember)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Logged out, not redirected, and the dead cookie is dropped.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let clearing = cookies_named(&response, "wigtopia_remember");
    assert!(!clearing.is_empty(), "expired cookie was not cleared");
    assert!(
        clearing[0].contains("Max-Age=0") || clearing[0].to_lowercase().contains("expires"),
        "clearing cookie has no expiry: {}",
        clearing[0]
    );
}

#[tokio::test]
async fn logout_invalidates_remember_token_in_storage() {
    let (app, state, _dir) = spawn_app().await;
    seed_shopper(&state, "ada@example.com", "sup3rsecret").await;

    let response = shop_login(&app, "ada@example.com", "sup3rsecret", true).await;
    let session = cookie_pair(&cookies_named(&response, "id")[0]);
    let remember = cookie_pair(&cookies_named(&response, "wigtopia_remember")[0]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/shop/logout")
                .header(header::COOKIE, format!("{session}; {remember}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old remember cookie no longer restores anything.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &remember)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn idle_admin_session_times_out_without_touching_shopper() {
    let (app, state, _dir) = spawn_app_with(|config| {
        config.session.idle_timeout_seconds = 1;
    })
    .await;
    seed_shopper(&state, "ada@example.com", "sup3rsecret").await;

    // Admin and shopper share one browser session.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = cookie_pair(&cookies_named(&response, "id")[0]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/shop/login")
                .header(header::COOKIE, &session)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "ada@example.com",
                        "password": "sup3rsecret",
                        "remember": false,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Shopper login cycles the session id; continue with the new cookie.
    let session = cookie_pair(&cookies_named(&response, "id")[0]);

    // Keep the shopper active while the admin idles: each /shop/me call
    // slides the shopper window, the admin window is never refreshed.
    tokio::time::sleep(std::time::Duration::from_millis(700)).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(700)).await;

    // Admin has now been idle past the timeout...
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // ...while the shopper, refreshed 700ms ago, is still logged in. Only
    // the timed-out role's keys were cleared.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/shop/me")
                .header(header::COOKIE, &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
