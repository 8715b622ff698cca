use super::Latency;
use crate::DomainError;
use crate::device::{DeviceGroupId, DeviceId};
use async_trait::async_trait;

/// Append-only, TTL-bounded storage of ping measurements plus a
/// most-recent-measurement index per device.
///
/// Reads never return measurements older than the store's retention window.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait LatencyStore: Send + Sync {
    /// Append to history and upsert the device's last-measurement entry.
    /// The index keeps whichever measurement has the greater `inserted_at`.
    async fn record(&self, latency: Latency) -> Result<(), DomainError>;

    /// Most recent measurement of a device, `None` if it never pinged.
    async fn last_latency(&self, device: &DeviceId) -> Result<Option<Latency>, DomainError>;

    /// One entry per device of the group that has a live measurement.
    async fn group_last_latencies(
        &self,
        group: &DeviceGroupId,
    ) -> Result<Vec<Latency>, DomainError>;

    /// Live history of one device, oldest first.
    async fn history(&self, device: &DeviceId) -> Result<Vec<Latency>, DomainError>;

    /// Drop history and index entry of a device. Succeeds when nothing is stored.
    async fn remove_latencies(&self, device: &DeviceId) -> Result<(), DomainError>;
}
