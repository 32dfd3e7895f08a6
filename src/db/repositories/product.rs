use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::products;

/// Server-side filter set for product listings. Everything here is bound as
/// a query parameter, never interpolated.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: ProductSort,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl ProductSort {
    #[must_use]
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name") => Self::NameAsc,
            _ => Self::Newest,
        }
    }
}

/// Field set for inserts/updates after validation and clamping.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub category_id: i32,
    pub price: f64,
    pub stock: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub hair_type: Option<String>,
    pub images: String,
    pub main_image_index: i32,
    pub featured: bool,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, filter: &ProductFilter) -> Result<(Vec<products::Model>, u64)> {
        let mut query = products::Entity::find();

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(products::Column::Name.contains(term))
                    .add(products::Column::Description.contains(term))
                    .add(products::Column::Category.contains(term)),
            );
        }

        if let Some(category_id) = filter.category_id {
            query = query.filter(products::Column::CategoryId.eq(category_id));
        }

        if let Some(featured) = filter.featured {
            query = query.filter(products::Column::Featured.eq(featured));
        }

        if filter.in_stock == Some(true) {
            query = query.filter(products::Column::Stock.gt(0));
        }

        if let Some(min) = filter.min_price {
            query = query.filter(products::Column::Price.gte(min));
        }

        if let Some(max) = filter.max_price {
            query = query.filter(products::Column::Price.lte(max));
        }

        query = match filter.sort {
            ProductSort::Newest => query.order_by_desc(products::Column::CreatedAt),
            ProductSort::PriceAsc => query.order_by_asc(products::Column::Price),
            ProductSort::PriceDesc => query.order_by_desc(products::Column::Price),
            ProductSort::NameAsc => query.order_by_asc(products::Column::Name),
        };

        let paginator = query.paginate(&self.conn, filter.page_size.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(filter.page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<products::Model>> {
        products::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product")
    }

    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<products::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query products by ids")
    }

    pub async fn create(&self, input: ProductInput) -> Result<products::Model> {
        let active = products::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category),
            category_id: Set(input.category_id),
            price: Set(input.price),
            stock: Set(input.stock),
            size: Set(input.size),
            color: Set(input.color),
            hair_type: Set(input.hair_type),
            images: Set(input.images),
            main_image_index: Set(input.main_image_index),
            featured: Set(input.featured),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert product")
    }

    pub async fn update(&self, id: i32, input: ProductInput) -> Result<Option<products::Model>> {
        let Some(product) = products::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = product.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.category = Set(input.category);
        active.category_id = Set(input.category_id);
        active.price = Set(input.price);
        active.stock = Set(input.stock);
        active.size = Set(input.size);
        active.color = Set(input.color);
        active.hair_type = Set(input.hair_type);
        active.images = Set(input.images);
        active.main_image_index = Set(input.main_image_index);
        active.featured = Set(input.featured);

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    /// Delete a product, returning the removed row so the caller can clean
    /// up its image files.
    pub async fn delete(&self, id: i32) -> Result<Option<products::Model>> {
        let Some(product) = products::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        products::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(Some(product))
    }

    pub async fn count(&self) -> Result<u64> {
        products::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count products")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_parsing_falls_back_to_newest() {
        assert_eq!(ProductSort::parse(Some("price_asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::parse(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::parse(Some("name")), ProductSort::NameAsc);
        assert_eq!(ProductSort::parse(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(None), ProductSort::Newest);
    }
}
