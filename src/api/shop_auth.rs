use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto, request_meta};
use crate::constants::session::REMEMBER_COOKIE;
use crate::db::repositories::admin::generate_token;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};
use crate::services::session::{
    self, Role, remember_cookie, remember_cookie_removal, remember_expiry,
};

/// Shopper principal id, inserted by [`remember_middleware`] when a live
/// session exists or a remember-me token restores one.
#[derive(Debug, Clone, Copy)]
pub struct ShopperId(pub i32);

#[derive(Deserialize)]
pub struct ShopLoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Serialize)]
pub struct ShopLoginResponse {
    pub name: String,
    pub email: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the shopper principal for shop routes. Login is not required;
/// the middleware only restores state.
///
/// With no live principal but a remember-me cookie present, the token is
/// matched against storage. A hit restores the session under a fresh
/// session id; a miss clears the cookie and the request proceeds logged out,
/// so an expired token can never loop the client through a restore.
pub async fn remember_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let timeout = state.config().session.idle_timeout_seconds;

    let shopper = session::principal(&session, Role::Shopper, timeout)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(id) = shopper {
        request.extensions_mut().insert(ShopperId(id));
        return Ok(next.run(request).await);
    }

    let Some(cookie) = jar.get(REMEMBER_COOKIE) else {
        return Ok(next.run(request).await);
    };

    let now = chrono::Utc::now().to_rfc3339();
    let restored = state
        .store()
        .find_user_by_remember_token(cookie.value(), &now)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check remember token: {e}")))?;

    match restored {
        Some(user) => {
            session::establish(&session, Role::Shopper, user.id)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to restore session: {e}")))?;

            request.extensions_mut().insert(ShopperId(user.id));
            Ok(next.run(request).await)
        }
        None => {
            let jar = jar.remove(remember_cookie_removal());
            let response = next.run(request).await;
            Ok((jar, response).into_response())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/shop/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<ShopLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .verify_user_credentials(&payload.email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    session::establish(&session, Role::Shopper, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let jar = if payload.remember {
        let token = generate_token();
        let days = state.config().session.remember_me_days;

        state
            .store()
            .set_remember_token(user.id, &token, &remember_expiry(days))
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store remember token: {e}")))?;

        jar.add(remember_cookie(
            token,
            days,
            state.config().server.secure_cookies,
        ))
    } else {
        jar
    };

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Shopper(user.id),
        event: AuditEvent::LoggedIn,
        meta: request_meta(&headers),
    });

    Ok((
        jar,
        Json(ApiResponse::success(ShopLoginResponse {
            name: user.name,
            email: user.email,
        })),
    ))
}

/// POST /api/shop/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    headers: HeaderMap,
    shopper: Option<Extension<ShopperId>>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(Extension(ShopperId(user_id))) = shopper {
        state
            .store()
            .clear_remember_token(user_id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to clear remember token: {e}")))?;

        let _ = state.event_bus().send(AuditEntry {
            actor: Actor::Shopper(user_id),
            event: AuditEvent::LoggedOut,
            meta: request_meta(&headers),
        });
    }

    session::clear_role(&session, Role::Shopper)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let jar = jar.remove(remember_cookie_removal());

    Ok((
        jar,
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    ))
}

/// GET /api/shop/me
pub async fn get_current_shopper(
    State(state): State<Arc<AppState>>,
    shopper: Option<Extension<ShopperId>>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Some(Extension(ShopperId(user_id))) = shopper else {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };

    let user = state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
