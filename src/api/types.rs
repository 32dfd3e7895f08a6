use serde::Serialize;

use crate::db::{CategoryWithCount, User};
use crate::entities::{orders, products};
use crate::services::uploads::split_images;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub category_id: i32,
    pub price: f64,
    pub stock: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub hair_type: Option<String>,
    pub images: Vec<String>,
    pub main_image_index: i32,
    pub featured: bool,
    pub created_at: String,
}

impl From<products::Model> for ProductDto {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            category_id: model.category_id,
            price: model.price,
            stock: model.stock,
            size: model.size,
            color: model.color,
            hair_type: model.hair_type,
            images: split_images(&model.images),
            main_image_index: model.main_image_index,
            featured: model.featured,
            created_at: model.created_at,
        }
    }
}

/// Paged listing; `has_more` drives the infinite-scroll client.
#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub product_count: u64,
    pub created_at: String,
}

impl From<CategoryWithCount> for CategoryDto {
    fn from(row: CategoryWithCount) -> Self {
        Self {
            id: row.id,
            name: row.name,
            icon: row.icon,
            description: row.description,
            product_count: row.product_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderSummaryDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_method: String,
    pub total: f64,
    pub status: String,
    pub created_at: String,
}

impl From<orders::Model> for OrderSummaryDto {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            payment_method: model.payment_method,
            total: model.total,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineDto {
    pub product_id: i32,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailsDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_address: String,
    pub payment_method: String,
    pub payment_proof: Option<String>,
    pub total: f64,
    pub status: String,
    pub created_at: String,
    pub items: Vec<OrderLineDto>,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartItemDto {
    pub product_id: i32,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub image: String,
    pub line_total: f64,
}

#[derive(Debug, Serialize)]
pub struct CartDto {
    pub items: Vec<CartItemDto>,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct ActivityLogDto {
    pub id: i64,
    pub actor_id: i32,
    pub action: String,
    pub details: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityLogPageDto {
    pub logs: Vec<ActivityLogDto>,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub version: String,
    pub uptime: u64,
    pub database_ok: bool,
    pub products: u64,
    pub categories: u64,
    pub orders: u64,
    pub users: u64,
    pub disk_space: DiskSpaceDto,
}

#[derive(Debug, Serialize)]
pub struct DiskSpaceDto {
    pub free: i64,
    pub total: i64,
}

pub const fn default_page() -> u64 {
    1
}

pub const fn default_page_size() -> u64 {
    crate::constants::limits::DEFAULT_PAGE_SIZE
}
