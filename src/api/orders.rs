use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminId;
use super::validation::validate_entity_id;
use super::{
    ApiError, ApiResponse, AppState, MessageResponse, OrderDetailsDto, OrderLineDto,
    OrderSummaryDto, PageDto, request_meta,
};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::{OrderFilter, OrderStatus};
use crate::domain::events::{Actor, AuditEntry, AuditEvent};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<i32>,
    #[serde(default = "super::types::default_page")]
    pub page: u64,
    #[serde(default = "super::types::default_page_size")]
    pub page_size: u64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// GET /api/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<PageDto<OrderSummaryDto>>>, ApiError> {
    if let Some(status) = query.status.as_deref()
        && OrderStatus::parse(status).is_none()
    {
        return Err(ApiError::validation(format!("Unknown status: {status}")));
    }

    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
    let page = query.page.max(1);

    let filter = OrderFilter {
        search: query.search,
        status: query.status,
        user_id: query.user_id,
        page,
        page_size,
    };

    let (items, total) = state
        .store()
        .list_orders(&filter)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let has_more = page * page_size < total;

    Ok(Json(ApiResponse::success(PageDto {
        items: items.into_iter().map(OrderSummaryDto::from).collect(),
        total,
        page,
        page_size,
        has_more,
    })))
}

/// GET /api/orders/{id}
pub async fn get_order_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDetailsDto>>, ApiError> {
    let id = validate_entity_id(id)?;

    let (order, lines) = state
        .store()
        .get_order_with_items(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    let items = lines
        .into_iter()
        .map(|(item, product)| OrderLineDto {
            product_id: item.product_id,
            product_name: product.map(|p| p.name),
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    Ok(Json(ApiResponse::success(OrderDetailsDto {
        id: order.id,
        user_id: order.user_id,
        customer_name: order.customer_name,
        customer_email: order.customer_email,
        customer_phone: order.customer_phone,
        customer_address: order.customer_address,
        payment_method: order.payment_method,
        payment_proof: order.payment_proof,
        total: order.total,
        status: order.status,
        created_at: order.created_at,
        items,
    })))
}

/// POST /api/orders/{id}/status
///
/// Transitions are admin-driven and unconstrained among the four valid
/// statuses; anything else is rejected with the row unchanged.
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;

    let status = OrderStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::validation(format!("Invalid order status: {}", payload.status))
    })?;

    let updated = state
        .store()
        .update_order_status(id, status)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !updated {
        return Err(ApiError::not_found("Order", id));
    }

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::OrderStatusChanged {
            order_id: id,
            status: status.as_str().to_string(),
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Order status set to {}", status.as_str()),
    })))
}

/// DELETE /api/orders/{id}
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;

    let deleted = state
        .store()
        .delete_order(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !deleted {
        return Err(ApiError::not_found("Order", id));
    }

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::OrderDeleted { order_id: id },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Order deleted".to_string(),
    })))
}
