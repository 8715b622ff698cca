pub mod api;
pub mod error;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use application::{DeviceManager, LatencyManager, StatusAggregator};
use domain::LatencyStore;
use domain::latency::LivenessPolicy;
use infrastructure::config::{LatencyBackend, ServiceConfig};
use infrastructure::remote::{
    DEFAULT_TIMEOUT, HttpApplicationCatalog, HttpCredentialService, HttpDeviceCatalog, RestClient,
};
use infrastructure::{InMemoryLatencyStore, SqliteLatencyStore};
use state::AppState;
use tracing::info;

/// Wire providers and managers from configuration.
pub async fn setup_app_state(config: &ServiceConfig) -> Result<Arc<AppState>> {
    let client_timeout = config.call_timeout().max(DEFAULT_TIMEOUT);
    let credentials = Arc::new(HttpCredentialService::new(RestClient::new(
        "credential service",
        &config.credential_service_url,
        client_timeout,
    )?));
    let catalog = Arc::new(HttpDeviceCatalog::new(RestClient::new(
        "device catalog",
        &config.device_catalog_url,
        client_timeout,
    )?));
    let applications = Arc::new(HttpApplicationCatalog::new(RestClient::new(
        "application catalog",
        &config.application_catalog_url,
        client_timeout,
    )?));

    let retention = config.latency.retention();
    let (latencies, sqlite): (Arc<dyn LatencyStore>, Option<Arc<SqliteLatencyStore>>) =
        match config.latency.backend {
            LatencyBackend::Memory => {
                info!("Using in-memory latency store");
                let store = Arc::new(InMemoryLatencyStore::with_retention(retention));
                (store as Arc<dyn LatencyStore>, None)
            }
            LatencyBackend::Sqlite => {
                let url = config.latency.sqlite_url.clone().unwrap_or_default();
                let store = Arc::new(SqliteLatencyStore::new(url, retention));
                store.connect().await?;
                info!("✅ SQLite latency store connected");
                (store.clone() as Arc<dyn LatencyStore>, Some(store))
            }
        };

    let status = StatusAggregator::new(
        latencies.clone(),
        LivenessPolicy::new(config.threshold()),
    );
    let devices = DeviceManager::new(credentials, catalog, applications, latencies.clone(), status);
    let latency_manager = LatencyManager::new(latencies);

    let mut state = AppState::new(
        devices,
        latency_manager,
        config.call_timeout(),
        config.request_deadline(),
    );
    state.sqlite = sqlite;
    Ok(Arc::new(state))
}
