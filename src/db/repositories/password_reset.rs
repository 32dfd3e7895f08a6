use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::admin_password_resets;

pub struct PasswordResetRepository {
    conn: DatabaseConnection,
}

impl PasswordResetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a reset token for an admin, superseding any earlier tokens.
    pub async fn issue(&self, admin_id: i32, token: &str, expires_at: &str) -> Result<()> {
        let txn = self.conn.begin().await?;

        admin_password_resets::Entity::delete_many()
            .filter(admin_password_resets::Column::AdminId.eq(admin_id))
            .exec(&txn)
            .await?;

        let active = admin_password_resets::ActiveModel {
            admin_id: Set(admin_id),
            token: Set(token.to_string()),
            expires_at: Set(expires_at.to_string()),
            ..Default::default()
        };
        active.insert(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Consume a token: valid only while `expires_at > now`, deleted on use.
    /// Returns the admin id the token belonged to.
    pub async fn consume(&self, token: &str, now: &str) -> Result<Option<i32>> {
        let txn = self.conn.begin().await?;

        let Some(row) = admin_password_resets::Entity::find()
            .filter(admin_password_resets::Column::Token.eq(token))
            .filter(admin_password_resets::Column::ExpiresAt.gt(now))
            .one(&txn)
            .await
            .context("Failed to query password reset token")?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let admin_id = row.admin_id;
        admin_password_resets::Entity::delete_by_id(row.id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(Some(admin_id))
    }
}
