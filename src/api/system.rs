use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, DiskSpaceDto, SystemInfo};

/// GET /api/system/info
pub async fn get_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemInfo>>, ApiError> {
    let database_ok = state.store().ping().await.is_ok();

    let counts = state
        .store()
        .entity_counts()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let uploads_path = state.config().uploads.uploads_path.clone();
    let disk = tokio::task::spawn_blocking(move || disk_space_blocking(&uploads_path))
        .await
        .unwrap_or(None)
        .unwrap_or((0, 0));

    Ok(Json(ApiResponse::success(SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database_ok,
        products: counts.products,
        categories: counts.categories,
        orders: counts.orders,
        users: counts.users,
        disk_space: DiskSpaceDto {
            free: disk.0,
            total: disk.1,
        },
    })))
}

/// Gets disk space using the df command (Unix-like systems).
fn disk_space_blocking(path: &str) -> Option<(i64, i64)> {
    use std::process::Command;

    let output = Command::new("df").arg("-B1").arg(path).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);

    let line = stdout.lines().nth(1)?;
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() >= 4 {
        let total = parts[1].parse().ok()?;
        let free = parts[3].parse().ok()?;
        Some((free, total))
    } else {
        None
    }
}
