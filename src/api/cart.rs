use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::shop_auth::ShopperId;
use super::{ApiError, ApiResponse, AppState, CartDto, CartItemDto, request_meta};
use crate::constants::{PLACEHOLDER_IMAGE, session::CART_KEY};
use crate::domain::events::{Actor, AuditEntry, AuditEvent};
use crate::services::uploads::split_images;

/// One line of the session-stored cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

async fn read_cart(session: &Session) -> Result<Vec<CartLine>, ApiError> {
    session
        .get::<Vec<CartLine>>(CART_KEY)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

async fn write_cart(session: &Session, cart: &Vec<CartLine>) -> Result<(), ApiError> {
    session
        .insert(CART_KEY, cart)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

fn audit_cart_change(
    state: &AppState,
    shopper: Option<&Extension<ShopperId>>,
    headers: &HeaderMap,
    detail: String,
) {
    if let Some(Extension(ShopperId(user_id))) = shopper {
        let _ = state.event_bus().send(AuditEntry {
            actor: Actor::Shopper(*user_id),
            event: AuditEvent::CartChanged { detail },
            meta: request_meta(headers),
        });
    }
}

/// Build the response view: cart lines joined with current product rows.
/// Lines whose product has disappeared are dropped silently.
async fn render_cart(state: &AppState, cart: &[CartLine]) -> Result<CartDto, ApiError> {
    let ids: Vec<i32> = cart.iter().map(|line| line.product_id).collect();
    let products = state
        .store()
        .get_products(&ids)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let mut items = Vec::with_capacity(cart.len());
    let mut total = 0.0;

    for line in cart {
        let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
            continue;
        };

        let images = split_images(&product.images);
        let image = images
            .get(product.main_image_index.max(0) as usize)
            .or_else(|| images.first())
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        let line_total = product.price * f64::from(line.quantity);
        total += line_total;

        items.push(CartItemDto {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            image,
            line_total,
        });
    }

    Ok(CartDto { items, total })
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<CartDto>>, ApiError> {
    let cart = read_cart(&session).await?;
    let dto = render_cart(&state, &cart).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /api/cart/add
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    session: Session,
    shopper: Option<Extension<ShopperId>>,
    headers: HeaderMap,
    Json(payload): Json<CartItemRequest>,
) -> Result<Json<ApiResponse<CartDto>>, ApiError> {
    if payload.quantity <= 0 {
        return Err(ApiError::validation("Quantity must be positive"));
    }

    let product = state
        .store()
        .get_product(payload.product_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Product", payload.product_id))?;

    if product.stock <= 0 {
        return Err(ApiError::validation(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let mut cart = read_cart(&session).await?;
    if let Some(line) = cart.iter_mut().find(|l| l.product_id == payload.product_id) {
        line.quantity += payload.quantity;
    } else {
        cart.push(CartLine {
            product_id: payload.product_id,
            quantity: payload.quantity,
        });
    }
    write_cart(&session, &cart).await?;

    audit_cart_change(
        &state,
        shopper.as_ref(),
        &headers,
        format!("added product #{} x{}", payload.product_id, payload.quantity),
    );

    let dto = render_cart(&state, &cart).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /api/cart/update
///
/// A quantity of zero or less removes the line.
pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    shopper: Option<Extension<ShopperId>>,
    headers: HeaderMap,
    Json(payload): Json<CartItemRequest>,
) -> Result<Json<ApiResponse<CartDto>>, ApiError> {
    let mut cart = read_cart(&session).await?;

    if payload.quantity <= 0 {
        cart.retain(|l| l.product_id != payload.product_id);
    } else if let Some(line) = cart.iter_mut().find(|l| l.product_id == payload.product_id) {
        line.quantity = payload.quantity;
    } else {
        return Err(ApiError::not_found("Cart item", payload.product_id));
    }

    write_cart(&session, &cart).await?;

    audit_cart_change(
        &state,
        shopper.as_ref(),
        &headers,
        format!(
            "set product #{} quantity to {}",
            payload.product_id, payload.quantity
        ),
    );

    let dto = render_cart(&state, &cart).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /api/cart/remove
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    session: Session,
    shopper: Option<Extension<ShopperId>>,
    headers: HeaderMap,
    Json(payload): Json<CartItemRequest>,
) -> Result<Json<ApiResponse<CartDto>>, ApiError> {
    let mut cart = read_cart(&session).await?;
    cart.retain(|l| l.product_id != payload.product_id);
    write_cart(&session, &cart).await?;

    audit_cart_change(
        &state,
        shopper.as_ref(),
        &headers,
        format!("removed product #{}", payload.product_id),
    );

    let dto = render_cart(&state, &cart).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /api/cart/clear
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    session: Session,
    shopper: Option<Extension<ShopperId>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CartDto>>, ApiError> {
    let cart: Vec<CartLine> = Vec::new();
    write_cart(&session, &cart).await?;

    audit_cart_change(&state, shopper.as_ref(), &headers, "cleared cart".to_string());

    Ok(Json(ApiResponse::success(CartDto {
        items: Vec::new(),
        total: 0.0,
    })))
}
