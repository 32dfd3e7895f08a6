//! Session principal management.
//!
//! Both roles live in the same cookie-backed session but under separate
//! keys, each with its own last-activity timestamp. Expiring one role never
//! touches the other's keys.

use anyhow::{Context, Result};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_sessions::Session;

use crate::constants::session as keys;
use crate::db::repositories::admin::generate_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Shopper,
}

impl Role {
    const fn id_key(self) -> &'static str {
        match self {
            Self::Admin => keys::ADMIN_ID_KEY,
            Self::Shopper => keys::USER_ID_KEY,
        }
    }

    const fn activity_key(self) -> &'static str {
        match self {
            Self::Admin => keys::ADMIN_ACTIVITY_KEY,
            Self::Shopper => keys::USER_ACTIVITY_KEY,
        }
    }
}

/// Attach a principal to the session after a successful login.
/// The session id is cycled first: login is a privilege change.
pub async fn establish(session: &Session, role: Role, id: i32) -> Result<()> {
    session
        .cycle_id()
        .await
        .context("Failed to cycle session id")?;
    session.insert(role.id_key(), id).await?;
    session
        .insert(role.activity_key(), chrono::Utc::now().timestamp())
        .await?;
    Ok(())
}

/// Sliding-expiration principal check.
///
/// Returns the principal id when one exists and the role's last activity is
/// within `timeout_secs`, refreshing the activity timestamp. A timed-out
/// role has its keys cleared and yields None.
pub async fn principal(session: &Session, role: Role, timeout_secs: i64) -> Result<Option<i32>> {
    let Some(id) = session.get::<i32>(role.id_key()).await? else {
        return Ok(None);
    };

    let now = chrono::Utc::now().timestamp();
    let last_activity = session
        .get::<i64>(role.activity_key())
        .await?
        .unwrap_or(0);

    if now - last_activity > timeout_secs {
        clear_role(session, role).await?;
        return Ok(None);
    }

    session.insert(role.activity_key(), now).await?;
    Ok(Some(id))
}

/// Remove one role's keys, leaving the other role logged in.
pub async fn clear_role(session: &Session, role: Role) -> Result<()> {
    let _ = session.remove::<i32>(role.id_key()).await?;
    let _ = session.remove::<i64>(role.activity_key()).await?;
    Ok(())
}

// ---- CSRF ----

/// Get the session's CSRF token, minting one if absent.
pub async fn csrf_token(session: &Session) -> Result<String> {
    if let Some(token) = session.get::<String>(keys::CSRF_KEY).await? {
        return Ok(token);
    }

    let token = generate_token();
    session.insert(keys::CSRF_KEY, token.clone()).await?;
    Ok(token)
}

/// Validate a submitted CSRF token. On success the token is rotated so it
/// cannot be replayed across mutations.
pub async fn check_and_rotate_csrf(session: &Session, provided: Option<&str>) -> Result<bool> {
    let Some(expected) = session.get::<String>(keys::CSRF_KEY).await? else {
        return Ok(false);
    };

    let ok = provided == Some(expected.as_str());
    if ok {
        session
            .insert(keys::CSRF_KEY, generate_token())
            .await?;
    }
    Ok(ok)
}

// ---- Remember-me cookie ----

#[must_use]
pub fn remember_cookie(token: String, days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((keys::REMEMBER_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(days))
        .build()
}

/// An expired replacement cookie; browsers drop the stored value.
#[must_use]
pub fn remember_cookie_removal() -> Cookie<'static> {
    Cookie::build((keys::REMEMBER_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .build()
}

#[must_use]
pub fn remember_expiry(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339()
}
