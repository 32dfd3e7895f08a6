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
    ApiError, ApiResponse, AppState, MessageResponse, OrderSummaryDto, PageDto, UserDto,
    request_meta,
};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::OrderFilter;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    #[serde(default = "super::types::default_page")]
    pub page: u64,
    #[serde(default = "super::types::default_page_size")]
    pub page_size: u64,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<PageDto<UserDto>>>, ApiError> {
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
    let page = query.page.max(1);

    let (items, total) = state
        .store()
        .list_users(query.search.as_deref(), page, page_size)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let has_more = page * page_size < total;

    Ok(Json(ApiResponse::success(PageDto {
        items: items.into_iter().map(UserDto::from).collect(),
        total,
        page,
        page_size,
        has_more,
    })))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_entity_id(id)?;

    let user = state
        .store()
        .get_user(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /api/users/{id}/orders
pub async fn get_user_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<OrderSummaryDto>>>, ApiError> {
    let id = validate_entity_id(id)?;

    let filter = OrderFilter {
        user_id: Some(id),
        page: 1,
        page_size: MAX_PAGE_SIZE,
        ..Default::default()
    };

    let (orders, _) = state
        .store()
        .list_orders(&filter)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        orders.into_iter().map(OrderSummaryDto::from).collect(),
    )))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;

    let deleted = state
        .store()
        .delete_user(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !deleted {
        return Err(ApiError::not_found("User", id));
    }

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::UserDeleted { user_id: id },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}
