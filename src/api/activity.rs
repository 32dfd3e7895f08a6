use axum::{
    Extension, Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminId;
use super::{
    ActivityLogDto, ActivityLogPageDto, ApiError, ApiResponse, AppState, MessageResponse,
    request_meta,
};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub action: Option<String>,
    #[serde(default = "super::types::default_page")]
    pub page: u64,
    #[serde(default = "super::types::default_page_size")]
    pub page_size: u64,
}

/// GET /api/activity/admin
pub async fn list_admin_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<ActivityLogPageDto>>, ApiError> {
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

    let (logs, total_pages) = state
        .store()
        .list_admin_activity(query.page.max(1), page_size, query.action)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(ActivityLogPageDto {
        logs: logs
            .into_iter()
            .map(|row| ActivityLogDto {
                id: row.id,
                actor_id: row.admin_id,
                action: row.action,
                details: row.details,
                ip: row.ip,
                user_agent: row.user_agent,
                created_at: row.created_at,
            })
            .collect(),
        total_pages,
    })))
}

/// GET /api/activity/users
pub async fn list_user_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<ActivityLogPageDto>>, ApiError> {
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

    let (logs, total_pages) = state
        .store()
        .list_user_activity(query.page.max(1), page_size, query.action)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(ActivityLogPageDto {
        logs: logs
            .into_iter()
            .map(|row| ActivityLogDto {
                id: row.id,
                actor_id: row.user_id,
                action: row.action,
                details: row.details,
                ip: row.ip,
                user_agent: row.user_agent,
                created_at: row.created_at,
            })
            .collect(),
        total_pages,
    })))
}

/// DELETE /api/activity/admin
pub async fn clear_admin_activity(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rows = state
        .store()
        .clear_admin_activity()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::ActivityLogCleared { rows },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Removed {rows} admin activity rows"),
    })))
}

/// DELETE /api/activity/users
pub async fn clear_user_activity(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rows = state
        .store()
        .clear_user_activity()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::ActivityLogCleared { rows },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Removed {rows} user activity rows"),
    })))
}
