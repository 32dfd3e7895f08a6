use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{order_items, orders, products};

/// Order lifecycle states. Transitions are admin-driven and unconstrained
/// among these values; anything else is rejected before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Processing" => Some(Self::Processing),
            "Delivered" => Some(Self::Delivered),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<i32>,
    pub page: u64,
    pub page_size: u64,
}

/// An order line joined with its product row (None if the product was
/// deleted after the order was placed).
pub type OrderLine = (order_items::Model, Option<products::Model>);

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, filter: &OrderFilter) -> Result<(Vec<orders::Model>, u64)> {
        let mut query = orders::Entity::find().order_by_desc(orders::Column::CreatedAt);

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(orders::Column::CustomerName.contains(term))
                    .add(orders::Column::CustomerEmail.contains(term))
                    .add(orders::Column::CustomerPhone.contains(term)),
            );
        }

        if let Some(status) = filter.status.as_deref() {
            query = query.filter(orders::Column::Status.eq(status));
        }

        if let Some(user_id) = filter.user_id {
            query = query.filter(orders::Column::UserId.eq(user_id));
        }

        let paginator = query.paginate(&self.conn, filter.page_size.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(filter.page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<orders::Model>> {
        orders::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query order")
    }

    pub async fn get_with_items(&self, id: i32) -> Result<Option<(orders::Model, Vec<OrderLine>)>> {
        let Some(order) = orders::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let lines = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id))
            .find_also_related(products::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query order items")?;

        Ok(Some((order, lines)))
    }

    /// Set the status of an order. Returns false when the order is missing.
    pub async fn update_status(&self, id: i32, status: OrderStatus) -> Result<bool> {
        let Some(order) = orders::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: orders::ActiveModel = order.into();
        active.status = Set(status.as_str().to_string());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        order_items::Entity::delete_many()
            .filter(order_items::Column::OrderId.eq(id))
            .exec(&self.conn)
            .await?;

        let result = orders::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete order")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        orders::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count orders")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!(OrderStatus::parse("Pending"), Some(OrderStatus::Pending));
        assert_eq!(OrderStatus::parse("Delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("Shipped"), None);
        assert_eq!(OrderStatus::parse("pending"), None);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
    }
}
