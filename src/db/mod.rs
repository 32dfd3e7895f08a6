use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

use crate::config::SecurityConfig;
use crate::entities::{
    admin_activity_log, categories, orders, products, user_activity_log,
};

pub use repositories::activity::RequestMeta;
pub use repositories::admin::Admin;
pub use repositories::analytics::{
    BreakdownRow, CategoryPerformanceRow, DailyActivityRow, EntityCounts, MonthlyRevenueRow,
    TopProductRow, UserGrowthRow,
};
pub use repositories::category::{CategoryDelete, CategoryWithCount};
pub use repositories::order::{OrderFilter, OrderLine, OrderStatus};
pub use repositories::product::{ProductFilter, ProductInput, ProductSort};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    fn activity_repo(&self) -> repositories::activity::ActivityRepository {
        repositories::activity::ActivityRepository::new(self.conn.clone())
    }

    fn password_reset_repo(&self) -> repositories::password_reset::PasswordResetRepository {
        repositories::password_reset::PasswordResetRepository::new(self.conn.clone())
    }

    fn analytics_repo(&self) -> repositories::analytics::AnalyticsRepository {
        repositories::analytics::AnalyticsRepository::new(self.conn.clone())
    }

    // ---- admins ----

    pub async fn get_admin(&self, id: i32) -> Result<Option<Admin>> {
        self.admin_repo().get_by_id(id).await
    }

    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn verify_admin_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>> {
        self.admin_repo().verify_credentials(username, password).await
    }

    pub async fn update_admin_password(
        &self,
        admin_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.admin_repo()
            .update_password(admin_id, new_password, config)
            .await
    }

    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Admin> {
        self.admin_repo().create(username, password, config).await
    }

    // ---- password resets ----

    pub async fn issue_password_reset(
        &self,
        admin_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.password_reset_repo()
            .issue(admin_id, token, expires_at)
            .await
    }

    pub async fn consume_password_reset(&self, token: &str, now: &str) -> Result<Option<i32>> {
        self.password_reset_repo().consume(token, now).await
    }

    // ---- shoppers ----

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(
        &self,
        search: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        self.user_repo().list(search, page, page_size).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn set_remember_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.user_repo()
            .set_remember_token(user_id, token, expires_at)
            .await
    }

    pub async fn clear_remember_token(&self, user_id: i32) -> Result<()> {
        self.user_repo().clear_remember_token(user_id).await
    }

    pub async fn find_user_by_remember_token(
        &self,
        token: &str,
        now: &str,
    ) -> Result<Option<User>> {
        self.user_repo().find_by_remember_token(token, now).await
    }

    // ---- categories ----

    pub async fn list_categories(&self) -> Result<Vec<CategoryWithCount>> {
        self.category_repo().list_with_counts().await
    }

    pub async fn get_category(&self, id: i32) -> Result<Option<categories::Model>> {
        self.category_repo().get(id).await
    }

    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        self.category_repo().get_by_name(name).await
    }

    pub async fn create_category(
        &self,
        name: &str,
        icon: Option<&str>,
        description: Option<&str>,
    ) -> Result<categories::Model> {
        self.category_repo().create(name, icon, description).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        name: &str,
        icon: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<categories::Model>> {
        self.category_repo().update(id, name, icon, description).await
    }

    pub async fn delete_category(&self, id: i32) -> Result<CategoryDelete> {
        self.category_repo().delete(id).await
    }

    // ---- products ----

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<products::Model>, u64)> {
        self.product_repo().list(filter).await
    }

    pub async fn get_product(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().get(id).await
    }

    pub async fn get_products(&self, ids: &[i32]) -> Result<Vec<products::Model>> {
        self.product_repo().get_many(ids).await
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<products::Model> {
        self.product_repo().create(input).await
    }

    pub async fn update_product(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<Option<products::Model>> {
        self.product_repo().update(id, input).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().delete(id).await
    }

    // ---- orders ----

    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<orders::Model>, u64)> {
        self.order_repo().list(filter).await
    }

    pub async fn get_order(&self, id: i32) -> Result<Option<orders::Model>> {
        self.order_repo().get(id).await
    }

    pub async fn get_order_with_items(
        &self,
        id: i32,
    ) -> Result<Option<(orders::Model, Vec<OrderLine>)>> {
        self.order_repo().get_with_items(id).await
    }

    pub async fn update_order_status(&self, id: i32, status: OrderStatus) -> Result<bool> {
        self.order_repo().update_status(id, status).await
    }

    pub async fn delete_order(&self, id: i32) -> Result<bool> {
        self.order_repo().delete(id).await
    }

    // ---- activity logs ----

    pub async fn add_admin_activity(
        &self,
        admin_id: i32,
        action: &str,
        details: Option<String>,
        meta: &RequestMeta,
    ) -> Result<()> {
        self.activity_repo()
            .add_admin(admin_id, action, details, meta)
            .await
    }

    pub async fn add_user_activity(
        &self,
        user_id: i32,
        action: &str,
        details: Option<String>,
        meta: &RequestMeta,
    ) -> Result<()> {
        self.activity_repo()
            .add_user(user_id, action, details, meta)
            .await
    }

    pub async fn list_admin_activity(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<admin_activity_log::Model>, u64)> {
        self.activity_repo()
            .list_admin(page, page_size, action_filter)
            .await
    }

    pub async fn list_user_activity(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<user_activity_log::Model>, u64)> {
        self.activity_repo()
            .list_user(page, page_size, action_filter)
            .await
    }

    pub async fn clear_admin_activity(&self) -> Result<u64> {
        self.activity_repo().clear_admin().await
    }

    pub async fn clear_user_activity(&self) -> Result<u64> {
        self.activity_repo().clear_user().await
    }

    // ---- analytics ----

    pub async fn monthly_revenue(&self, months: u32) -> Result<Vec<MonthlyRevenueRow>> {
        self.analytics_repo().monthly_revenue(months).await
    }

    pub async fn top_products(&self, limit: u64) -> Result<Vec<TopProductRow>> {
        self.analytics_repo().top_products(limit).await
    }

    pub async fn category_performance(&self) -> Result<Vec<CategoryPerformanceRow>> {
        self.analytics_repo().category_performance().await
    }

    pub async fn user_growth(&self, months: u32) -> Result<Vec<UserGrowthRow>> {
        self.analytics_repo().user_growth(months).await
    }

    pub async fn payment_method_breakdown(&self) -> Result<Vec<BreakdownRow>> {
        self.analytics_repo().payment_method_breakdown().await
    }

    pub async fn status_breakdown(&self) -> Result<Vec<BreakdownRow>> {
        self.analytics_repo().status_breakdown().await
    }

    pub async fn daily_activity(&self, days: i64) -> Result<Vec<DailyActivityRow>> {
        self.analytics_repo().daily_activity(days).await
    }

    pub async fn entity_counts(&self) -> Result<EntityCounts> {
        self.analytics_repo().entity_counts().await
    }
}
