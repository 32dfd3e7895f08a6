use std::sync::Arc;

use crate::constants::PLACEHOLDER_IMAGE;
use crate::db::{ProductInput, Store};
use crate::entities::{categories, products};
use crate::services::uploads::{
    UploadError, UploadService, UploadedFile, finalize_images, split_images,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Product {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Product fields as submitted, before image handling.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub price: f64,
    pub stock: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub hair_type: Option<String>,
    pub featured: bool,
    pub main_image_index: i64,
}

/// Orchestrates product mutations: validation, image persistence, and the
/// placeholder/main-index rules for the stored image list.
///
/// Field validation runs before any file is written, so a rejected draft
/// never leaves stray images in the uploads directory.
pub struct CatalogService {
    store: Store,
    uploads: Arc<UploadService>,
}

impl CatalogService {
    #[must_use]
    pub const fn new(store: Store, uploads: Arc<UploadService>) -> Self {
        Self { store, uploads }
    }

    async fn validate_draft(&self, draft: &ProductDraft) -> Result<categories::Model, CatalogError> {
        if draft.name.trim().is_empty() {
            return Err(CatalogError::Validation("Product name is required".into()));
        }

        self.store
            .get_category(draft.category_id)
            .await?
            .ok_or_else(|| CatalogError::Validation("Selected category does not exist".into()))
    }

    fn build_input(
        draft: ProductDraft,
        category: categories::Model,
        images: String,
        main_image_index: i32,
    ) -> ProductInput {
        ProductInput {
            name: draft.name.trim().to_string(),
            description: draft.description,
            category: category.name,
            category_id: category.id,
            price: draft.price.max(0.0),
            stock: draft.stock.max(0),
            size: draft.size,
            color: draft.color,
            hair_type: draft.hair_type,
            images,
            main_image_index,
            featured: draft.featured,
        }
    }

    pub async fn create_product(
        &self,
        draft: ProductDraft,
        files: Vec<UploadedFile>,
    ) -> Result<products::Model, CatalogError> {
        let category = self.validate_draft(&draft).await?;

        let stored = self.uploads.store_batch(&files).await?;
        let (images, main) = finalize_images(stored, draft.main_image_index);

        let input = Self::build_input(draft, category, images, main);
        Ok(self.store.create_product(input).await?)
    }

    /// Update a product, merging the kept existing images with newly
    /// uploaded ones. Existing images absent from `kept_images` are
    /// unlinked best-effort after the row update succeeds.
    pub async fn update_product(
        &self,
        id: i32,
        draft: ProductDraft,
        kept_images: Vec<String>,
        files: Vec<UploadedFile>,
    ) -> Result<products::Model, CatalogError> {
        let existing = self
            .store
            .get_product(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let category = self.validate_draft(&draft).await?;

        let current = split_images(&existing.images);
        let mut merged: Vec<String> = current
            .iter()
            .filter(|name| kept_images.contains(name) && name.as_str() != PLACEHOLDER_IMAGE)
            .cloned()
            .collect();

        let stored = self.uploads.store_batch(&files).await?;
        merged.extend(stored);

        let removed: Vec<String> = current
            .iter()
            .filter(|name| !merged.contains(name))
            .cloned()
            .collect();

        let (images, main) = finalize_images(merged, draft.main_image_index);
        let input = Self::build_input(draft, category, images, main);

        let updated = self
            .store
            .update_product(id, input)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        if !removed.is_empty() {
            self.uploads.delete_images(&removed.join(",")).await;
        }

        Ok(updated)
    }

    /// Delete a product and best-effort unlink its stored images.
    pub async fn delete_product(&self, id: i32) -> Result<Option<products::Model>, CatalogError> {
        let Some(deleted) = self.store.delete_product(id).await? else {
            return Ok(None);
        };

        self.uploads.delete_images(&deleted.images).await;
        Ok(Some(deleted))
    }
}
