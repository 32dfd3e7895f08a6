use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Datelike, Months, Utc};
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::db::repositories::order::OrderStatus;
use crate::entities::{categories, order_items, orders, products, users};

/// Revenue and order count for one calendar month.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct MonthlyRevenueRow {
    pub month: String,
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct TopProductRow {
    pub product_id: i32,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryPerformanceRow {
    pub category: String,
    pub products: u64,
    pub units_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct UserGrowthRow {
    pub month: String,
    pub signups: i64,
}

/// Count/total pair keyed by payment method or order status.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct BreakdownRow {
    pub key: String,
    pub count: i64,
    pub total: f64,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct DailyActivityRow {
    pub day: String,
    pub orders: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EntityCounts {
    pub products: u64,
    pub categories: u64,
    pub orders: u64,
    pub users: u64,
}

pub struct AnalyticsRepository {
    conn: DatabaseConnection,
}

impl AnalyticsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// First day of the month `months - 1` back from now, as the stored
    /// timestamp format, so a trailing window includes the current month.
    fn month_window_start(months: u32) -> String {
        let now = Utc::now();
        let first_of_month = now
            .date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive());
        let start = first_of_month
            .checked_sub_months(Months::new(months.saturating_sub(1)))
            .unwrap_or(first_of_month);
        format!("{start}T00:00:00+00:00")
    }

    fn day_window_start(days: i64) -> String {
        let start = Utc::now().date_naive() - chrono::Duration::days(days.saturating_sub(1));
        format!("{start}T00:00:00+00:00")
    }

    /// Revenue and order counts per month over the trailing window.
    /// Cancelled orders are excluded from every revenue aggregate.
    pub async fn monthly_revenue(&self, months: u32) -> Result<Vec<MonthlyRevenueRow>> {
        let month: SimpleExpr = Func::cust(Alias::new("strftime"))
            .arg("%Y-%m")
            .arg(Expr::col((orders::Entity, orders::Column::CreatedAt)))
            .into();

        orders::Entity::find()
            .select_only()
            .column_as(month.clone(), "month")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((orders::Entity, orders::Column::Total)))), "revenue")
            .column_as(SimpleExpr::from(Func::count(Expr::col((orders::Entity, orders::Column::Id)))), "orders")
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled.as_str()))
            .filter(orders::Column::CreatedAt.gte(Self::month_window_start(months)))
            .group_by(month)
            .order_by_asc(Expr::col(Alias::new("month")))
            .into_model::<MonthlyRevenueRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate monthly revenue")
    }

    pub async fn top_products(&self, limit: u64) -> Result<Vec<TopProductRow>> {
        let line_revenue = SimpleExpr::from(Func::sum(
            Expr::col((order_items::Entity, order_items::Column::Quantity))
                .mul(Expr::col((order_items::Entity, order_items::Column::Price))),
        ));

        order_items::Entity::find()
            .select_only()
            .column_as(order_items::Column::ProductId, "product_id")
            .column_as(products::Column::Name, "name")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((order_items::Entity, order_items::Column::Quantity)))), "quantity_sold")
            .column_as(line_revenue, "revenue")
            .join(JoinType::InnerJoin, order_items::Relation::Products.def())
            .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled.as_str()))
            .group_by(order_items::Column::ProductId)
            .order_by_desc(Expr::col(Alias::new("quantity_sold")))
            .limit(limit)
            .into_model::<TopProductRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate top products")
    }

    /// Units and revenue grouped by the product's category, merged with the
    /// per-category product counts.
    pub async fn category_performance(&self) -> Result<Vec<CategoryPerformanceRow>> {
        #[derive(FromQueryResult)]
        struct SalesRow {
            category: String,
            units_sold: i64,
            revenue: f64,
        }

        let line_revenue = SimpleExpr::from(Func::sum(
            Expr::col((order_items::Entity, order_items::Column::Quantity))
                .mul(Expr::col((order_items::Entity, order_items::Column::Price))),
        ));

        let sales = order_items::Entity::find()
            .select_only()
            .column_as(products::Column::Category, "category")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((order_items::Entity, order_items::Column::Quantity)))), "units_sold")
            .column_as(line_revenue, "revenue")
            .join(JoinType::InnerJoin, order_items::Relation::Products.def())
            .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled.as_str()))
            .group_by(products::Column::Category)
            .into_model::<SalesRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate category sales")?;

        let mut by_name: BTreeMap<String, CategoryPerformanceRow> = BTreeMap::new();

        for category in categories::Entity::find().all(&self.conn).await? {
            let count = products::Entity::find()
                .filter(products::Column::CategoryId.eq(category.id))
                .count(&self.conn)
                .await?;

            by_name.insert(
                category.name.clone(),
                CategoryPerformanceRow {
                    category: category.name,
                    products: count,
                    units_sold: 0,
                    revenue: 0.0,
                },
            );
        }

        for row in sales {
            let entry = by_name
                .entry(row.category.clone())
                .or_insert_with(|| CategoryPerformanceRow {
                    category: row.category.clone(),
                    products: 0,
                    units_sold: 0,
                    revenue: 0.0,
                });
            entry.units_sold = row.units_sold;
            entry.revenue = row.revenue;
        }

        Ok(by_name.into_values().collect())
    }

    pub async fn user_growth(&self, months: u32) -> Result<Vec<UserGrowthRow>> {
        let month: SimpleExpr = Func::cust(Alias::new("strftime"))
            .arg("%Y-%m")
            .arg(Expr::col((users::Entity, users::Column::CreatedAt)))
            .into();

        users::Entity::find()
            .select_only()
            .column_as(month.clone(), "month")
            .column_as(SimpleExpr::from(Func::count(Expr::col((users::Entity, users::Column::Id)))), "signups")
            .filter(users::Column::CreatedAt.gte(Self::month_window_start(months)))
            .group_by(month)
            .order_by_asc(Expr::col(Alias::new("month")))
            .into_model::<UserGrowthRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate user growth")
    }

    pub async fn payment_method_breakdown(&self) -> Result<Vec<BreakdownRow>> {
        orders::Entity::find()
            .select_only()
            .column_as(orders::Column::PaymentMethod, "key")
            .column_as(SimpleExpr::from(Func::count(Expr::col((orders::Entity, orders::Column::Id)))), "count")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((orders::Entity, orders::Column::Total)))), "total")
            .group_by(orders::Column::PaymentMethod)
            .order_by_desc(Expr::col(Alias::new("count")))
            .into_model::<BreakdownRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate payment methods")
    }

    pub async fn status_breakdown(&self) -> Result<Vec<BreakdownRow>> {
        orders::Entity::find()
            .select_only()
            .column_as(orders::Column::Status, "key")
            .column_as(SimpleExpr::from(Func::count(Expr::col((orders::Entity, orders::Column::Id)))), "count")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((orders::Entity, orders::Column::Total)))), "total")
            .group_by(orders::Column::Status)
            .order_by_desc(Expr::col(Alias::new("count")))
            .into_model::<BreakdownRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate order statuses")
    }

    pub async fn daily_activity(&self, days: i64) -> Result<Vec<DailyActivityRow>> {
        let day: SimpleExpr = Func::cust(Alias::new("strftime"))
            .arg("%Y-%m-%d")
            .arg(Expr::col((orders::Entity, orders::Column::CreatedAt)))
            .into();

        orders::Entity::find()
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(SimpleExpr::from(Func::count(Expr::col((orders::Entity, orders::Column::Id)))), "orders")
            .column_as(SimpleExpr::from(Func::sum(Expr::col((orders::Entity, orders::Column::Total)))), "revenue")
            .filter(orders::Column::CreatedAt.gte(Self::day_window_start(days)))
            .group_by(day)
            .order_by_asc(Expr::col(Alias::new("day")))
            .into_model::<DailyActivityRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate daily activity")
    }

    pub async fn entity_counts(&self) -> Result<EntityCounts> {
        Ok(EntityCounts {
            products: products::Entity::find().count(&self.conn).await?,
            categories: categories::Entity::find().count(&self.conn).await?,
            orders: orders::Entity::find().count(&self.conn).await?,
            users: users::Entity::find().count(&self.conn).await?,
        })
    }
}
