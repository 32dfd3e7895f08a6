use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tower::ServiceExt;
use wigtopia::api::AppState;
use wigtopia::config::Config;

async fn spawn_app() -> (Router, Arc<AppState>, tempfile::TempDir) {
    let uploads_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.server.secure_cookies = false;
    config.uploads.uploads_path = uploads_dir.path().to_string_lossy().to_string();

    let state = wigtopia::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    (wigtopia::api::router(state.clone()), state, uploads_dir)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("id="))
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}

async fn seed_product(state: &AppState, name: &str, price: f64, stock: i64) -> i32 {
    let category = wigtopia::entities::categories::ActiveModel {
        name: Set(format!("{name} category")),
        icon: Set(None),
        description: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&state.store().conn)
    .await
    .unwrap();

    let product = wigtopia::entities::products::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        category: Set(category.name.clone()),
        category_id: Set(category.id),
        price: Set(price),
        stock: Set(stock),
        size: Set(None),
        color: Set(None),
        hair_type: Set(None),
        images: Set("placeholder.png".to_string()),
        main_image_index: Set(0),
        featured: Set(false),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&state.store().conn)
    .await
    .unwrap();

    product.id
}

#[tokio::test]
async fn serves_the_spa_shell_at_root() {
    let (app, _state, _dir) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Wigtopia"));
}

#[tokio::test]
async fn public_product_listing_is_open() {
    let (app, _state, _dir) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn cart_add_update_remove_flow() {
    let (app, state, _dir) = spawn_app().await;
    let product_id = seed_product(&state, "Silky Bob", 25.0, 3).await;

    // Guest cart: no login needed, state lives in the session.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/add")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"product_id": product_id, "quantity": 2}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("cart should create a session");
    let body = json_body(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 50.0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/update")
                .header(header::COOKIE, &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"product_id": product_id, "quantity": 1}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 25.0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/remove")
                .header(header::COOKIE, &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"product_id": product_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total"], 0.0);
}

#[tokio::test]
async fn out_of_stock_products_cannot_be_added() {
    let (app, state, _dir) = spawn_app().await;
    let product_id = seed_product(&state, "Sold Out Wig", 40.0, 0).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/add")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"product_id": product_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn password_reset_round_trip() {
    let (app, state, _dir) = spawn_app().await;

    // Request a token for the seeded operator; grab it from storage the way
    // an operator would grab it from the server log.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/reset/request")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({"username": "admin"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    use sea_orm::EntityTrait;
    let reset = wigtopia::entities::admin_password_resets::Entity::find()
        .one(&state.store().conn)
        .await
        .unwrap()
        .expect("reset token row missing");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/reset/confirm")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"token": reset.token, "new_password": "brandnewpass"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Token is single-use.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/reset/confirm")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"token": reset.token, "new_password": "anotherpass1"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The new password works, the old one does not.
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
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "brandnewpass"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
