//! Domain events for the application.
//!
//! Mutating handlers emit these on the event bus instead of writing audit
//! rows inline; a separate subscriber persists them. A lost event must never
//! affect the mutation that produced it.

use serde::Serialize;

use crate::db::RequestMeta;

/// Who performed an audited action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "id")]
pub enum Actor {
    Admin(i32),
    Shopper(i32),
}

/// Events recorded to the activity logs.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuditEvent {
    LoggedIn,
    LoggedOut,
    PasswordChanged,
    PasswordResetRequested,
    PasswordResetCompleted,

    ProductCreated { product_id: i32, name: String },
    ProductUpdated { product_id: i32, name: String },
    ProductDeleted { product_id: i32, name: String },

    CategoryCreated { category_id: i32, name: String },
    CategoryUpdated { category_id: i32, name: String },
    CategoryDeleted { category_id: i32, name: String },

    OrderStatusChanged { order_id: i32, status: String },
    OrderDeleted { order_id: i32 },

    UserDeleted { user_id: i32 },

    ActivityLogCleared { rows: u64 },

    CartChanged { detail: String },
}

impl AuditEvent {
    /// Short action name stored in the log's `action` column.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::LoggedIn => "login",
            Self::LoggedOut => "logout",
            Self::PasswordChanged => "password_change",
            Self::PasswordResetRequested => "password_reset_request",
            Self::PasswordResetCompleted => "password_reset",
            Self::ProductCreated { .. } => "product_create",
            Self::ProductUpdated { .. } => "product_update",
            Self::ProductDeleted { .. } => "product_delete",
            Self::CategoryCreated { .. } => "category_create",
            Self::CategoryUpdated { .. } => "category_update",
            Self::CategoryDeleted { .. } => "category_delete",
            Self::OrderStatusChanged { .. } => "order_status_update",
            Self::OrderDeleted { .. } => "order_delete",
            Self::UserDeleted { .. } => "user_delete",
            Self::ActivityLogCleared { .. } => "activity_log_clear",
            Self::CartChanged { .. } => "cart_update",
        }
    }
}

/// One audited action: actor, what happened, and the request it came from.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    pub actor: Actor,
    pub event: AuditEvent,
    #[serde(skip)]
    pub meta: RequestMeta,
}
