use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{admin_activity_log, prelude::*, user_activity_log};

/// Context captured from the request that triggered an audited action.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct ActivityRepository {
    conn: DatabaseConnection,
}

impl ActivityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add_admin(
        &self,
        admin_id: i32,
        action: &str,
        details: Option<String>,
        meta: &RequestMeta,
    ) -> Result<()> {
        let active_model = admin_activity_log::ActiveModel {
            admin_id: Set(admin_id),
            action: Set(action.to_string()),
            details: Set(details),
            ip: Set(meta.ip.clone()),
            user_agent: Set(meta.user_agent.clone()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        AdminActivityLog::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn add_user(
        &self,
        user_id: i32,
        action: &str,
        details: Option<String>,
        meta: &RequestMeta,
    ) -> Result<()> {
        let active_model = user_activity_log::ActiveModel {
            user_id: Set(user_id),
            action: Set(action.to_string()),
            details: Set(details),
            ip: Set(meta.ip.clone()),
            user_agent: Set(meta.user_agent.clone()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        UserActivityLog::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn list_admin(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<admin_activity_log::Model>, u64)> {
        let mut query =
            AdminActivityLog::find().order_by_desc(admin_activity_log::Column::CreatedAt);

        if let Some(action) = action_filter {
            query = query.filter(admin_activity_log::Column::Action.contains(action));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn list_user(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<user_activity_log::Model>, u64)> {
        let mut query = UserActivityLog::find().order_by_desc(user_activity_log::Column::CreatedAt);

        if let Some(action) = action_filter {
            query = query.filter(user_activity_log::Column::Action.contains(action));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn clear_admin(&self) -> Result<u64> {
        let result = AdminActivityLog::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn clear_user(&self) -> Result<u64> {
        let result = UserActivityLog::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}
