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

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("id="))
        .and_then(|v| v.split(';').next())
        .expect("No session cookie in response")
        .to_string()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Log in as the seeded operator and return the session cookie.
async fn admin_login(app: &Router) -> String {
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
    session_cookie(&response)
}

async fn csrf_token(app: &Router, cookie: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/csrf")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["data"]["csrf_token"].as_str().unwrap().to_string()
}

const BOUNDARY: &str = "------------------------wigtopiaboundary";

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, filename, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, method: &str, cookie: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([180, 120, 90]));
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

async fn create_category(app: &Router, cookie: &str, name: &str, icon: &str) -> i32 {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/categories")
                .header(header::COOKIE, cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"name": name, "icon": icon}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
async fn admin_routes_require_authentication() {
    let (app, _state, _dir) = spawn_app().await;

    for uri in ["/api/orders", "/api/users", "/api/dashboard", "/api/system/info"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn bad_credentials_are_rejected_generically() {
    let (app, _state, _dir) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "wrong"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_appends_an_audit_row() {
    let (app, _state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;

    // The audit listener persists asynchronously; poll until it lands.
    let mut found = false;
    for _ in 0..30 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/activity/admin")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = json_body(response).await;
        let logs = body["data"]["logs"].as_array().unwrap().clone();
        if logs.iter().any(|l| l["action"] == "login") {
            found = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    assert!(found, "login audit row never appeared");
}

#[tokio::test]
async fn category_crud_and_referential_delete() {
    let (app, _state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;

    let category_id = create_category(&app, &cookie, "Bobs", "💇").await;

    // New category shows up in the public list with no products.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Bobs")
        .expect("Created category missing from list")
        .clone();
    assert_eq!(listed["product_count"], 0);
    assert_eq!(listed["icon"], "💇");

    // Duplicate names are refused.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/categories")
                .header(header::COOKIE, &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({"name": "Bobs"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Add a product into the category.
    let token = csrf_token(&app, &cookie).await;
    let body_bytes = multipart_body(
        &[
            ("name", "Classic Bob"),
            ("category_id", &category_id.to_string()),
            ("price", "49.99"),
            ("stock", "5"),
            ("csrf_token", &token),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/products", "POST", &cookie, body_bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let product_id = body["data"]["id"].as_i64().unwrap();
    // No uploads means the placeholder sentinel with main index 0.
    assert_eq!(body["data"]["images"][0], "placeholder.png");
    assert_eq!(body["data"]["main_image_index"], 0);

    // Deleting a category with dependents is refused with no rows deleted.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/categories/{category_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Remove the product (fresh CSRF: tokens rotate per mutation)...
    let token = csrf_token(&app, &cookie).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/products/{product_id}"))
                .header(header::COOKIE, &cookie)
                .header("x-csrf-token", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...and now the delete goes through.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/categories/{category_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_mutations_require_csrf() {
    let (app, _state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;
    let category_id = create_category(&app, &cookie, "Lace Fronts", "✨").await;

    let body_bytes = multipart_body(
        &[
            ("name", "No Token Wig"),
            ("category_id", &category_id.to_string()),
            ("price", "10"),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/products", "POST", &cookie, body_bytes))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn product_upload_and_image_lifecycle() {
    let (app, _state, uploads_dir) = spawn_app().await;
    let cookie = admin_login(&app).await;
    let category_id = create_category(&app, &cookie, "Curly", "🌀").await;

    let token = csrf_token(&app, &cookie).await;
    let body_bytes = multipart_body(
        &[
            ("name", "Curly Deluxe"),
            ("category_id", &category_id.to_string()),
            ("price", "89.50"),
            ("stock", "3"),
            ("main_image_index", "9"),
            ("csrf_token", &token),
        ],
        &[
            ("images", "front.png", &png_bytes()),
            ("images", "back.png", &png_bytes()),
        ],
    );

    let response = app
        .clone()
        .oneshot(multipart_request("/api/products", "POST", &cookie, body_bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let images: Vec<String> = body["data"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(images.len(), 2);
    // Requested index 9 is clamped into the final list.
    assert_eq!(body["data"]["main_image_index"], 1);

    for name in &images {
        assert!(uploads_dir.path().join(name).exists(), "{name} not written");
    }

    // Deleting the product removes its files from storage.
    let product_id = body["data"]["id"].as_i64().unwrap();
    let token = csrf_token(&app, &cookie).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/products/{product_id}"))
                .header(header::COOKIE, &cookie)
                .header("x-csrf-token", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for name in &images {
        assert!(!uploads_dir.path().join(name).exists(), "{name} survived");
    }
}

#[tokio::test]
async fn invalid_upload_aborts_the_whole_batch() {
    let (app, _state, uploads_dir) = spawn_app().await;
    let cookie = admin_login(&app).await;
    let category_id = create_category(&app, &cookie, "Straight", "📏").await;

    let token = csrf_token(&app, &cookie).await;
    let body_bytes = multipart_body(
        &[
            ("name", "Bad Upload Wig"),
            ("category_id", &category_id.to_string()),
            ("price", "20"),
            ("csrf_token", &token),
        ],
        &[
            ("images", "ok.png", &png_bytes()),
            ("images", "evil.png", b"this is not an image"),
        ],
    );

    let response = app
        .clone()
        .oneshot(multipart_request("/api/products", "POST", &cookie, body_bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written and no product row exists.
    assert_eq!(std::fs::read_dir(uploads_dir.path()).unwrap().count(), 0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products?search=Bad+Upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn order_status_update_rejects_unknown_status() {
    let (app, state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;

    let order = wigtopia::entities::orders::ActiveModel {
        user_id: Set(None),
        customer_name: Set("Grace".to_string()),
        customer_email: Set("grace@example.com".to_string()),
        customer_phone: Set(None),
        customer_address: Set("1 Main St".to_string()),
        payment_method: Set("cod".to_string()),
        payment_proof: Set(None),
        total: Set(120.0),
        status: Set("Pending".to_string()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&state.store().conn)
    .await
    .unwrap();

    // "Shipped" is not a valid status.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/orders/{}/status", order.id))
                .header(header::COOKIE, &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"status": "Shipped"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);

    // Row unchanged.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{}", order.id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "Pending");

    // A valid transition goes through.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/orders/{}/status", order.id))
                .header(header::COOKIE, &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"status": "Delivered"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{}", order.id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "Delivered");
}

#[tokio::test]
async fn product_listing_filters_and_pages() {
    let (app, _state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;
    let category_id = create_category(&app, &cookie, "Ponytails", "🎀").await;

    for (name, price) in [("Sleek Pony", "30"), ("Wavy Pony", "55"), ("Luxe Pony", "95")] {
        let token = csrf_token(&app, &cookie).await;
        let body_bytes = multipart_body(
            &[
                ("name", name),
                ("category_id", &category_id.to_string()),
                ("price", price),
                ("stock", "2"),
                ("csrf_token", &token),
            ],
            &[],
        );
        let response = app
            .clone()
            .oneshot(multipart_request("/api/products", "POST", &cookie, body_bytes))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Price window filter.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products?min_price=40&max_price=60")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Wavy Pony");

    // Paging drives has_more for the infinite-scroll client.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products?page=1&page_size=2&sort=price_asc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["has_more"], true);
    assert_eq!(body["data"]["items"][0]["name"], "Sleek Pony");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products?page=2&page_size=2&sort=price_asc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["has_more"], false);
}

#[tokio::test]
async fn dashboard_handles_an_empty_database() {
    let (app, _state, _dir) = spawn_app().await;
    let cookie = admin_login(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["monthly_revenue"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["top_products"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["order_statuses"].as_array().unwrap().len(), 0);
}
