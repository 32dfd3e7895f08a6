use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, request_meta};
use crate::db::repositories::admin::generate_token;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};
use crate::services::session::{self, Role};

/// Admin principal id resolved by [`admin_middleware`], available to every
/// handler behind it.
#[derive(Debug, Clone, Copy)]
pub struct AdminId(pub i32);

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
}

#[derive(Serialize)]
pub struct AdminInfoResponse {
    pub username: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetRequestPayload {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmPayload {
    pub token: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a live admin principal. The principal check is
/// sliding: each successful pass refreshes the admin's activity window.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let timeout = state.config().session.idle_timeout_seconds;

    let admin_id = session::principal(&session, Role::Admin, timeout)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(id) = admin_id else {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };

    request.extensions_mut().insert(AdminId(id));
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let admin = state
        .store()
        .verify_admin_credentials(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    session::establish(&session, Role::Admin, admin.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin.id),
        event: AuditEvent::LoggedIn,
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(LoginResponse {
        username: admin.username,
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let timeout = state.config().session.idle_timeout_seconds;
    if let Ok(Some(admin_id)) = session::principal(&session, Role::Admin, timeout).await {
        let _ = state.event_bus().send(AuditEntry {
            actor: Actor::Admin(admin_id),
            event: AuditEvent::LoggedOut,
            meta: request_meta(&headers),
        });
    }

    session::clear_role(&session, Role::Admin)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn get_current_admin(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
) -> Result<Json<ApiResponse<AdminInfoResponse>>, ApiError> {
    let admin = state
        .store()
        .get_admin(admin_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get admin: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ApiResponse::success(AdminInfoResponse {
        username: admin.username,
        created_at: admin.created_at,
    })))
}

/// GET /api/auth/csrf
pub async fn get_csrf_token(
    session: Session,
) -> Result<Json<ApiResponse<CsrfResponse>>, ApiError> {
    let csrf_token = session::csrf_token(&session)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Json(ApiResponse::success(CsrfResponse { csrf_token })))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::validation(
            "New password must be at least 8 characters",
        ));
    }

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let admin = state
        .store()
        .get_admin(admin_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get admin: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let verified = state
        .store()
        .verify_admin_credentials(&admin.username, &payload.current_password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;

    if verified.is_none() {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    state
        .store()
        .update_admin_password(admin_id, &payload.new_password, &state.config().security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::PasswordChanged,
        meta: request_meta(&headers),
    });

    tracing::info!("Password changed for admin: {}", admin.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// POST /api/auth/reset/request
///
/// Always answers with the same message so usernames cannot be enumerated.
/// The token is written to the server log for out-of-band delivery.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ResetRequestPayload>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if let Some(admin) = state
        .store()
        .get_admin_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to query admin: {e}")))?
    {
        let token = generate_token();
        let expires_at = (chrono::Utc::now()
            + chrono::Duration::minutes(state.config().session.password_reset_minutes))
        .to_rfc3339();

        state
            .store()
            .issue_password_reset(admin.id, &token, &expires_at)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to issue reset token: {e}")))?;

        let _ = state.event_bus().send(AuditEntry {
            actor: Actor::Admin(admin.id),
            event: AuditEvent::PasswordResetRequested,
            meta: request_meta(&headers),
        });

        tracing::info!(admin = %admin.username, token, "Password reset token issued");
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "If the account exists, a reset token has been issued".to_string(),
    })))
}

/// POST /api/auth/reset/confirm
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ResetConfirmPayload>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::validation(
            "New password must be at least 8 characters",
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let admin_id = state
        .store()
        .consume_password_reset(&payload.token, &now)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check reset token: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    state
        .store()
        .update_admin_password(admin_id, &payload.new_password, &state.config().security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::PasswordResetCompleted,
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password has been reset".to_string(),
    })))
}
