//! Dashboard analytics endpoints.
//!
//! Read-only aggregates, recomputed from the source tables on every request.
//! Chart scaling happens in [`crate::services::analytics`] so a zero-revenue
//! month range cannot divide by zero anywhere downstream.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::limits::TOP_PRODUCTS;
use crate::db::{MonthlyRevenueRow, TopProductRow};
use crate::services::analytics::DashboardData;

/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let data = state
        .analytics()
        .dashboard()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(data)))
}

/// GET /api/dashboard/revenue
pub async fn get_monthly_revenue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<MonthlyRevenueRow>>>, ApiError> {
    let rows = state
        .store()
        .monthly_revenue(12)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(rows)))
}

/// GET /api/dashboard/top-products
pub async fn get_top_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TopProductRow>>>, ApiError> {
    let rows = state
        .store()
        .top_products(TOP_PRODUCTS)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(rows)))
}
