pub mod analytics;
pub mod audit;
pub mod catalog;
pub mod session;
pub mod uploads;

pub use analytics::AnalyticsService;
pub use audit::AuditService;
pub use catalog::{CatalogError, CatalogService, ProductDraft};
pub use uploads::{UploadError, UploadService, UploadedFile};
