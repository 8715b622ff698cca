//! Infrastructure layer - External integrations

pub mod config;
pub mod latency;
pub mod remote;

pub use config::{LatencyBackend, ServiceConfig};
pub use latency::{InMemoryLatencyStore, SqliteLatencyStore};
pub use remote::{HttpApplicationCatalog, HttpCredentialService, HttpDeviceCatalog, RestClient};
