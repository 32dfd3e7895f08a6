use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tokio::task;

use crate::entities::users;

/// Shopper data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            created_at: model.created_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Free-text search over name/email/phone, newest first, paged.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        let mut query = users::Entity::find().order_by_desc(users::Column::CreatedAt);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Name.contains(term))
                    .add(users::Column::Email.contains(term))
                    .add(users::Column::Phone.contains(term)),
            );
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(User::from).collect(), total))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    /// Verify credentials; returns the shopper on success, None on any mismatch.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn set_remember_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for remember token update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.remember_token = Set(Some(token.to_string()));
        active.remember_token_expires = Set(Some(expires_at.to_string()));
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn clear_remember_token(&self, user_id: i32) -> Result<()> {
        let Some(user) = users::Entity::find_by_id(user_id).one(&self.conn).await? else {
            return Ok(());
        };

        let mut active: users::ActiveModel = user.into();
        active.remember_token = Set(None);
        active.remember_token_expires = Set(None);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Look up a stored remember-me token that has not yet expired.
    pub async fn find_by_remember_token(&self, token: &str, now: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::RememberToken.eq(token))
            .filter(users::Column::RememberTokenExpires.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query user by remember token")?;

        Ok(user.map(User::from))
    }
}
