use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{categories, products};

#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub product_count: u64,
}

/// Outcome of a category delete attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum CategoryDelete {
    Deleted,
    NotFound,
    /// Refused: this many products still reference the category.
    InUse(u64),
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        let mut out = Vec::with_capacity(rows.len());
        for category in rows {
            let product_count = products::Entity::find()
                .filter(products::Column::CategoryId.eq(category.id))
                .count(&self.conn)
                .await?;

            out.push(CategoryWithCount {
                id: category.id,
                name: category.name,
                icon: category.icon,
                description: category.description,
                created_at: category.created_at,
                product_count,
            });
        }

        Ok(out)
    }

    pub async fn get(&self, id: i32) -> Result<Option<categories::Model>> {
        categories::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query category by name")
    }

    /// Insert a category. A duplicate name surfaces as a database unique
    /// violation, which callers translate to a conflict message.
    pub async fn create(
        &self,
        name: &str,
        icon: Option<&str>,
        description: Option<&str>,
    ) -> Result<categories::Model> {
        let active = categories::ActiveModel {
            name: Set(name.to_string()),
            icon: Set(icon.map(ToString::to_string)),
            description: Set(description.map(ToString::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert category")
    }

    /// Update a category; a rename is propagated to the denormalized
    /// category name stored on products.
    pub async fn update(
        &self,
        id: i32,
        name: &str,
        icon: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<categories::Model>> {
        let txn = self.conn.begin().await?;

        let Some(category) = categories::Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let renamed = category.name != name;

        let mut active: categories::ActiveModel = category.into();
        active.name = Set(name.to_string());
        active.icon = Set(icon.map(ToString::to_string));
        active.description = Set(description.map(ToString::to_string));
        let updated = active.update(&txn).await?;

        if renamed {
            products::Entity::update_many()
                .col_expr(
                    products::Column::Category,
                    sea_orm::sea_query::Expr::value(name),
                )
                .filter(products::Column::CategoryId.eq(id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(Some(updated))
    }

    /// Referential delete: counts dependent products and refuses when any
    /// exist. Count and delete share one transaction so a concurrent product
    /// insert cannot slip between them.
    pub async fn delete(&self, id: i32) -> Result<CategoryDelete> {
        let txn = self.conn.begin().await?;

        if categories::Entity::find_by_id(id).one(&txn).await?.is_none() {
            txn.rollback().await?;
            return Ok(CategoryDelete::NotFound);
        }

        let dependents = products::Entity::find()
            .filter(products::Column::CategoryId.eq(id))
            .count(&txn)
            .await?;

        if dependents > 0 {
            txn.rollback().await?;
            return Ok(CategoryDelete::InUse(dependents));
        }

        categories::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(CategoryDelete::Deleted)
    }
}
