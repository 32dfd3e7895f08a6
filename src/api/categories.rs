use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminId;
use super::validation::{validate_category_name, validate_entity_id};
use super::{ApiError, ApiResponse, AppState, CategoryDto, MessageResponse, request_meta};
use crate::db::CategoryDelete;
use crate::domain::events::{Actor, AuditEntry, AuditEvent};

#[derive(Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// GET /api/categories
///
/// Public: the storefront filter widget needs the category list.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state
        .store()
        .list_categories()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        categories.into_iter().map(CategoryDto::from).collect(),
    )))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    headers: HeaderMap,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let name = validate_category_name(&payload.name)?;

    if state
        .store()
        .get_category_by_name(name)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "A category named '{name}' already exists"
        )));
    }

    let category = state
        .store()
        .create_category(name, payload.icon.as_deref(), payload.description.as_deref())
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::CategoryCreated {
            category_id: category.id,
            name: category.name.clone(),
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(CategoryDto {
        id: category.id,
        name: category.name,
        icon: category.icon,
        description: category.description,
        product_count: 0,
        created_at: category.created_at,
    })))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;
    let name = validate_category_name(&payload.name)?;

    if let Some(existing) = state
        .store()
        .get_category_by_name(name)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        && existing.id != id
    {
        return Err(ApiError::conflict(format!(
            "A category named '{name}' already exists"
        )));
    }

    let updated = state
        .store()
        .update_category(id, name, payload.icon.as_deref(), payload.description.as_deref())
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    let _ = state.event_bus().send(AuditEntry {
        actor: Actor::Admin(admin_id),
        event: AuditEvent::CategoryUpdated {
            category_id: updated.id,
            name: updated.name,
        },
        meta: request_meta(&headers),
    });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Category updated".to_string(),
    })))
}

/// DELETE /api/categories/{id}
///
/// Refused while products still reference the category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(AdminId(admin_id)): Extension<AdminId>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_entity_id(id)?;

    let name = state
        .store()
        .get_category(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .map(|c| c.name);

    match state
        .store()
        .delete_category(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
    {
        CategoryDelete::Deleted => {
            let _ = state.event_bus().send(AuditEntry {
                actor: Actor::Admin(admin_id),
                event: AuditEvent::CategoryDeleted {
                    category_id: id,
                    name: name.unwrap_or_default(),
                },
                meta: request_meta(&headers),
            });

            Ok(Json(ApiResponse::success(MessageResponse {
                message: "Category deleted".to_string(),
            })))
        }
        CategoryDelete::NotFound => Err(ApiError::not_found("Category", id)),
        CategoryDelete::InUse(count) => Err(ApiError::conflict(format!(
            "Cannot delete category: {count} products still reference it"
        ))),
    }
}
