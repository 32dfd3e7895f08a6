use axum::{
    Router,
    http::{HeaderMap, HeaderValue},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::RequestMeta;
use crate::state::SharedState;

pub mod activity;
mod assets;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod dashboard;
mod error;
mod observability;
pub mod orders;
pub mod products;
pub mod shop_auth;
pub mod system;
mod types;
pub mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub const fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub const fn event_bus(
        &self,
    ) -> &tokio::sync::broadcast::Sender<crate::domain::events::AuditEntry> {
        &self.shared.event_bus
    }

    #[must_use]
    pub const fn catalog(&self) -> &Arc<crate::services::CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub const fn analytics(&self) -> &Arc<crate::services::AnalyticsService> {
        &self.shared.analytics
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

/// Capture the request context recorded on audit rows.
#[must_use]
pub fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    RequestMeta { ip, user_agent }
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let uploads_path = config.uploads.uploads_path.clone();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let secure_cookies = config.server.secure_cookies;

    let admin_routes = create_admin_router(state.clone());
    let shop_routes = create_shop_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_expiry(Expiry::OnSessionEnd);

    let api_router = Router::new()
        .merge(admin_routes)
        .merge(shop_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/reset/request", post(auth::request_password_reset))
        .route("/auth/reset/confirm", post(auth::confirm_password_reset))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route("/categories", get(categories::list_categories))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(uploads_path),
        )
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_metrics))
}

/// Routes behind the admin principal check.
fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_admin))
        .route("/auth/csrf", get(auth::get_csrf_token))
        .route("/auth/password", put(auth::change_password))
        .route("/products", post(products::create_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route("/categories", post(categories::create_category))
        .route("/categories/{id}", put(categories::update_category))
        .route("/categories/{id}", delete(categories::delete_category))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order_details))
        .route("/orders/{id}/status", post(orders::update_order_status))
        .route("/orders/{id}", delete(orders::delete_order))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/orders", get(users::get_user_orders))
        .route("/users/{id}", delete(users::delete_user))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/revenue", get(dashboard::get_monthly_revenue))
        .route("/dashboard/top-products", get(dashboard::get_top_products))
        .route("/activity/admin", get(activity::list_admin_activity))
        .route("/activity/users", get(activity::list_user_activity))
        .route("/activity/admin", delete(activity::clear_admin_activity))
        .route("/activity/users", delete(activity::clear_user_activity))
        .route("/system/info", get(system::get_info))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::admin_middleware,
        ))
}

/// Shopper-facing routes. These do not require a login, but a remember-me
/// cookie is honored to restore a lapsed shopper session.
fn create_shop_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/shop/login", post(shop_auth::login))
        .route("/shop/logout", post(shop_auth::logout))
        .route("/shop/me", get(shop_auth::get_current_shopper))
        .route("/cart", get(cart::get_cart))
        .route("/cart/add", post(cart::add_to_cart))
        .route("/cart/update", post(cart::update_cart_item))
        .route("/cart/remove", post(cart::remove_from_cart))
        .route("/cart/clear", post(cart::clear_cart))
        .route_layer(middleware::from_fn_with_state(
            state,
            shop_auth::remember_middleware,
        ))
}
