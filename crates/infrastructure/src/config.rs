use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use domain::DomainError;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LatencyBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LatencyConfig {
    #[serde(default = "default_backend")]
    pub backend: LatencyBackend,
    #[serde(default)]
    pub sqlite_url: Option<String>,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_url: None,
            retention_hours: default_retention_hours(),
        }
    }
}

impl LatencyConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 60 * 60)
    }
}

fn default_backend() -> LatencyBackend {
    LatencyBackend::Memory
}
fn default_retention_hours() -> u64 {
    24
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub credential_service_url: String,
    pub device_catalog_url: String,
    pub application_catalog_url: String,
    /// A device is ONLINE while its last ping is younger than this.
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,
    #[serde(default)]
    pub latency: LatencyConfig,
}

fn default_port() -> u16 {
    6010
}
fn default_threshold_secs() -> u64 {
    180
}
fn default_call_timeout_secs() -> u64 {
    5
}
fn default_request_deadline_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("credential_service_url", "http://localhost:8810")?
            .set_default("device_catalog_url", "http://localhost:6020")?
            .set_default("application_catalog_url", "http://localhost:8081")?
            // Shared defaults, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per-environment overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. DEVICE_MANAGER__LATENCY__BACKEND=sqlite)
            .add_source(Environment::with_prefix("DEVICE_MANAGER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.port == 0 {
            return Err(DomainError::invalid_argument("port must be set"));
        }
        for (name, url) in [
            ("credential_service_url", &self.credential_service_url),
            ("device_catalog_url", &self.device_catalog_url),
            ("application_catalog_url", &self.application_catalog_url),
        ] {
            if url.is_empty() {
                return Err(DomainError::invalid_argument(format!("{name} must be set")));
            }
        }
        if self.threshold_secs == 0 {
            return Err(DomainError::invalid_argument(
                "threshold_secs must be greater than zero",
            ));
        }
        if self.latency.backend == LatencyBackend::Sqlite
            && self.latency.sqlite_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(DomainError::invalid_argument(
                "latency.sqlite_url is required for the sqlite backend",
            ));
        }
        Ok(())
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  port: {}", self.port);
        info!("  credential service: {}", self.credential_service_url);
        info!("  device catalog: {}", self.device_catalog_url);
        info!("  application catalog: {}", self.application_catalog_url);
        info!("  liveness threshold: {}s", self.threshold_secs);
        info!(
            "  call timeout: {}s, request deadline: {}s",
            self.call_timeout_secs, self.request_deadline_secs
        );
        info!(
            "  latency store: {:?} (retention {}h)",
            self.latency.backend, self.latency.retention_hours
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig {
            port: default_port(),
            credential_service_url: "http://authx:8810".to_string(),
            device_catalog_url: "http://catalog:6020".to_string(),
            application_catalog_url: "http://apps:8081".to_string(),
            threshold_secs: default_threshold_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            request_deadline_secs: default_request_deadline_secs(),
            latency: LatencyConfig::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold(), Duration::from_secs(180));
        assert_eq!(config.latency.retention(), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_sqlite_backend_requires_url() {
        let mut config = config();
        config.latency.backend = LatencyBackend::Sqlite;
        assert!(config.validate().is_err());

        config.latency.sqlite_url = Some("sqlite://latency.db".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let mut config = config();
        config.threshold_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_collaborator_url_is_rejected() {
        let mut config = config();
        config.device_catalog_url.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("device_catalog_url"));
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let config = ServiceConfig::load("/nonexistent-config-dir").unwrap();
        assert_eq!(config.port, 6010);
        assert_eq!(config.latency.backend, LatencyBackend::Memory);
    }
}
