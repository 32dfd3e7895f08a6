use crate::db::Store;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Persists audit entries from the event bus into the activity-log tables.
///
/// Insert failures are logged and swallowed; the mutation that emitted the
/// entry has already committed.
pub struct AuditService {
    store: Store,
    event_bus: broadcast::Sender<AuditEntry>,
}

impl AuditService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<AuditEntry>) -> Self {
        Self { store, event_bus }
    }

    pub fn start_listener(self: Arc<Self>) {
        let mut rx = self.event_bus.subscribe();
        let service = self;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(entry) => {
                        if let Err(e) = service.handle_entry(entry).await {
                            error!(error = %e, "Failed to save audit entry");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        error!(count, "Audit listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Audit listener event bus closed");
                        break;
                    }
                }
            }
        });
    }

    async fn handle_entry(&self, entry: AuditEntry) -> anyhow::Result<()> {
        let action = entry.event.action();
        let details = details_for(&entry.event);

        match entry.actor {
            Actor::Admin(admin_id) => {
                self.store
                    .add_admin_activity(admin_id, action, details, &entry.meta)
                    .await?;
            }
            Actor::Shopper(user_id) => {
                self.store
                    .add_user_activity(user_id, action, details, &entry.meta)
                    .await?;
            }
        }

        Ok(())
    }
}

fn details_for(event: &AuditEvent) -> Option<String> {
    match event {
        AuditEvent::LoggedIn
        | AuditEvent::LoggedOut
        | AuditEvent::PasswordChanged
        | AuditEvent::PasswordResetRequested
        | AuditEvent::PasswordResetCompleted => None,

        AuditEvent::ProductCreated { product_id, name }
        | AuditEvent::ProductUpdated { product_id, name }
        | AuditEvent::ProductDeleted { product_id, name } => {
            Some(format!("product #{product_id}: {name}"))
        }

        AuditEvent::CategoryCreated { category_id, name }
        | AuditEvent::CategoryUpdated { category_id, name }
        | AuditEvent::CategoryDeleted { category_id, name } => {
            Some(format!("category #{category_id}: {name}"))
        }

        AuditEvent::OrderStatusChanged { order_id, status } => {
            Some(format!("order #{order_id} -> {status}"))
        }
        AuditEvent::OrderDeleted { order_id } => Some(format!("order #{order_id}")),

        AuditEvent::UserDeleted { user_id } => Some(format!("user #{user_id}")),

        AuditEvent::ActivityLogCleared { rows } => Some(format!("{rows} rows removed")),

        AuditEvent::CartChanged { detail } => Some(detail.clone()),
    }
}
