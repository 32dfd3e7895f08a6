use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::AuditEntry;
use crate::services::{AnalyticsService, AuditService, CatalogService, UploadService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub uploads: Arc<UploadService>,

    pub catalog: Arc<CatalogService>,

    pub analytics: Arc<AnalyticsService>,

    pub event_bus: broadcast::Sender<AuditEntry>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::with_event_bus(config, event_bus).await
    }

    pub async fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<AuditEntry>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let uploads = Arc::new(UploadService::new(&config.uploads));
        let catalog = Arc::new(CatalogService::new(store.clone(), uploads.clone()));
        let analytics = Arc::new(AnalyticsService::new(store.clone()));

        let audit = Arc::new(AuditService::new(store.clone(), event_bus.clone()));
        audit.start_listener();

        Ok(Self {
            config,
            store,
            uploads,
            catalog,
            analytics,
            event_bus,
        })
    }
}
