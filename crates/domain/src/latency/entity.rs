use crate::device::DeviceId;
use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a measurement is kept before stores drop it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// A single ping measurement reported by a device. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latency {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    /// Round-trip time in milliseconds, always > 0 for a real measurement.
    pub latency_millis: i32,
    /// Ingestion time, epoch seconds.
    pub inserted_at: i64,
}

impl Latency {
    pub fn new(device: &DeviceId, latency_millis: i32, inserted_at: i64) -> Result<Self> {
        device.validate()?;
        if latency_millis <= 0 {
            return Err(DomainError::invalid_argument(
                "latency must be greater than zero",
            ));
        }
        Ok(Self {
            organization_id: device.organization_id.clone(),
            device_group_id: device.device_group_id.clone(),
            device_id: device.device_id.clone(),
            latency_millis,
            inserted_at,
        })
    }

    pub fn device(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }

    /// Epoch second at which this measurement stops being readable.
    pub fn expires_at(&self, retention: Duration) -> i64 {
        self.inserted_at
            .saturating_add(i64::try_from(retention.as_secs()).unwrap_or(i64::MAX))
    }

    pub fn is_expired(&self, retention: Duration, now: i64) -> bool {
        self.expires_at(retention) <= now
    }
}
