use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::AdminId;
use super::validation::validate_entity_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageDto, ProductDto, request_meta};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::{ProductFilter, ProductSort};
use crate::domain::events::{Actor, AuditEntry, AuditEvent};
use crate::services::uploads::{UploadedFile, split_images};
use crate::services::{ProductDraft, session};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category: Option<i32>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<String>,
    #[serde(default = "super::types::default_page")]
    pub page: u64,
    #[serde(default = "super::types::default_page_size")]
    pub page_size: u64,
}

/// GET /api/products
///
/// Public listing behind the storefront search/filter and infinite-scroll
/// widgets. Every filter is bound as a query parameter.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<PageDto<ProductDto>>>, ApiError> {
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
    let page = query.page.max(1);

    let filter = ProductFilter {
        search: query.search,
        category_id: query.category,
        featured: query.featured,
        in_stock: query.in_stock,
        min_price: query.min_price,
        max_price: query.max_price,
        sort: ProductSort::parse(query.sort.as_deref()),
        page,
        page_size,
    };

    let (items, total) = state
        .store()
        .list_products(&filter)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let has_more = page * page_size < total;

    Ok(Json(ApiResponse::success(PageDto {
        items: items.into_iter().map(ProductDto::from).collect(),
        total,
        page,
        page_size,
        has_more,
    })))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let id = validate_entity_id(id)?;

    let product = state
        .store()
        .get_product(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

/// Fields collected from a multipart product form.
struct ProductForm {
    name: String,
    description: Option<String>,
    category_id: Option<i32>,
    price: Option<f64>,
    stock: i64,
    size: Option<String>,
    color: Option<String>,
    hair_type: Option<String>,
    featured: bool,
    main_image_index: i64,
    existing_images: Vec<String>,
    csrf_token: Option<String>,
    files: Vec<UploadedFile>,
}

impl ProductForm {
    const fn empty() -> Self {
        Self {
            name: String::new(),
            description: None,
            category_id: None,
            price: None,
            stock: 0,
            size: None,
            color: None,
            hair_type: None,
            featured: false,
            main_image_index: 0,
            existing_images: Vec::new(),
            csrf_token: None,
            files: Vec::new(),
        }
    }

    fn into_draft(self) -> Result<(ProductDraft, Vec<String>, Vec<UploadedFile>, Option<String>), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Product name is required"));
        }
        let category_id = self
            .category_id
            .ok_or_else(|| ApiError::validation("Category is required"))?;
        let price = self
            .price
            .ok_or_else(|| ApiError::validation("Price is required"))?;

        let draft = ProductDraft {
            name: self.name,
            description: self.description,
            category_id,
            price,
            stock: self.stock,
            size: self.size,
            color: self.color,
            hair_type: self.hair_type,
            featured: self.featured,
            main_image_index: self.main_image_index,
        };

        Ok((draft, self.existing_images, self.files, self.csrf_token))
    }
}

async fn parse_product_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::empty();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" || name == "images[]" {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

            // An empty file input still submits a zero-length part.
            if !bytes.is_empty() {
                form.files.push(UploadedFile {
                    original_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read field {name}: {e}")))?;

        match name.as_str() {
            "name" => form.name = value,
            "description" => form.description = some_nonempty(value),
            "category_id" => {
                form.category_id = Some(
                    value
                        .parse()
                        .map_err(|_| ApiError::validation("Invalid category id"))?,
                );
            }
            "price" => {
                form.price = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| ApiError::validation("Invalid price"))?,
                );
            }
            "stock" => form.stock = value.parse().unwrap_or(0),
            "size" => form.size = some_nonempty(value),
            "color" => form.color = some_nonempty(value),
            "hair_type" => form.hair_type = some_nonempty(value),
            "featured" => form.featured = matches!(value.as_str(), "1" | "true" | "on"),
            "main_image_index" => form.main_image_index = value.parse().unwrap_or(0),
            "existing_images" => form.existing_images = split_images(&value),
            "csrf_token" => form.csrf_token = some_nonempty(value),
            _ => {}
        }
    }

    Ok(form)
}

fn some_nonempty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Product mutations require the per-session CSRF token, submitted either
/// as an `X-Csrf-Token` header or a `csrf_token` form field. The token is
/// rotated on success so it cannot be replayed.
async fn require_csrf(
    session: &Session,
    headers: &HeaderMap,
    form_token: Option<&str>,
) -> Result<(), ApiError> {
    let provided = headers
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .or(form_token);

    let ok = session::check_and_rotate_csrf(session, provided)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if ok {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Invalid CSRF token".to_string()))
    }
}

/// POST /api/products  (multipart)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    session: Session,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let form = parse_product_form(multipart).await?;
    let (draft, _, files, csrf) = form.into_draft()?;
    require_csrf(&session, &headers, csrf.as_deref()).await?;

    let product = state.catalog().create_product(draft, files).await?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::ProductCreated {
            product_id: product.id,
            name: product.name.clone(),
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

/// PUT /api/products/{id}  (multipart)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    session: Session,
    Path(id): Path<i32>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let id = validate_entity_id(id)?;

    let form = parse_product_form(multipart).await?;
    let (draft, existing_images, files, csrf) = form.into_draft()?;
    require_csrf(&session, &headers, csrf.as_deref()).await?;

    let product = state
        .catalog()
        .update_product(id, draft, existing_images, files)
        .await?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::ProductUpdated {
            product_id: product.id,
            name: product.name.clone(),
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(ProductDto::from(product))))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    session: Session,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;
    require_csrf(&session, &headers, None).await?;

    let deleted = state
        .catalog()
        .delete_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::ProductDeleted {
            product_id: deleted.id,
            name: deleted.name,
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Product deleted".to_string(),
    })))
}
