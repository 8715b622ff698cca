use std::collections::HashMap;
use std::sync::Arc;

use domain::device::{DeviceGroupId, DeviceStatus, ManagedDevice};
use domain::latency::{Latency, LatencyStore, LivenessPolicy};
use tracing::{debug, warn};

use crate::context::CallContext;

/// Layers liveness status onto device reads.
///
/// Status is best-effort metadata: a store failure degrades the affected
/// devices to `Offline` and is logged, it never fails the read itself.
pub struct StatusAggregator {
    store: Arc<dyn LatencyStore>,
    policy: LivenessPolicy,
}

impl StatusAggregator {
    pub fn new(store: Arc<dyn LatencyStore>, policy: LivenessPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.policy
    }

    /// Classify a single device from its last measurement.
    pub async fn annotate_device(&self, ctx: &CallContext, device: &mut ManagedDevice) {
        let id = device.id();
        let last = ctx
            .call("get last latency", self.store.last_latency(&id))
            .await;

        device.device_status = match last {
            Ok(last) => self.policy.classify(last.as_ref(), now()),
            Err(e) => {
                warn!(device = %id, error = %e, "Failed to read device latency, reporting OFFLINE");
                DeviceStatus::Offline
            }
        };
    }

    /// Classify every device of a group with a single store read.
    pub async fn annotate_group(
        &self,
        ctx: &CallContext,
        group: &DeviceGroupId,
        devices: &mut [ManagedDevice],
    ) {
        if devices.is_empty() {
            return;
        }

        let latencies = match ctx
            .call("get group last latencies", self.store.group_last_latencies(group))
            .await
        {
            Ok(latencies) => latencies,
            Err(e) => {
                warn!(
                    device_group = %group,
                    error = %e,
                    "Failed to read group latencies, reporting all devices OFFLINE"
                );
                for device in devices.iter_mut() {
                    device.device_status = DeviceStatus::Offline;
                }
                return;
            }
        };

        let by_device: HashMap<&str, &Latency> = latencies
            .iter()
            .map(|latency| (latency.device_id.as_str(), latency))
            .collect();

        let now = now();
        for device in devices.iter_mut() {
            let last = by_device.get(device.device_id.as_str()).copied();
            device.device_status = self.policy.classify(last, now);
        }

        debug!(
            device_group = %group,
            devices = devices.len(),
            measured = by_device.len(),
            "Annotated group device status"
        );
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainError;
    use domain::device::{Device, DeviceCredentials, DeviceId};
    use domain::latency::MockLatencyStore;
    use std::time::Duration;

    const THRESHOLD: Duration = Duration::from_secs(3 * 60);

    fn managed(device_id: &str) -> ManagedDevice {
        let device = Device::new(
            "org-1".to_string(),
            "dg-1".to_string(),
            device_id.to_string(),
            0,
        );
        let credentials = DeviceCredentials {
            organization_id: "org-1".to_string(),
            device_group_id: "dg-1".to_string(),
            device_id: device_id.to_string(),
            enabled: true,
            device_api_key: format!("{device_id}-key"),
        };
        let mut managed = ManagedDevice::from_parts(device, credentials);
        // Make sure annotation overwrites whatever was there.
        managed.device_status = DeviceStatus::Online;
        managed
    }

    fn pinged(device_id: &str, seconds_ago: i64) -> Latency {
        Latency::new(
            &DeviceId::new("org-1", "dg-1", device_id),
            25,
            now() - seconds_ago,
        )
        .unwrap()
    }

    fn aggregator(store: MockLatencyStore) -> StatusAggregator {
        StatusAggregator::new(Arc::new(store), LivenessPolicy::new(THRESHOLD))
    }

    #[tokio::test]
    async fn test_single_device_recent_ping_is_online() {
        let mut store = MockLatencyStore::new();
        store
            .expect_last_latency()
            .withf(|id: &DeviceId| id.device_id == "sensor-1")
            .times(1)
            .returning(|_| Ok(Some(pinged("sensor-1", 2 * 60))));

        let mut device = managed("sensor-1");
        device.device_status = DeviceStatus::Offline;
        aggregator(store)
            .annotate_device(&CallContext::default(), &mut device)
            .await;
        assert_eq!(device.device_status, DeviceStatus::Online);
    }

    #[tokio::test]
    async fn test_single_device_stale_ping_is_offline() {
        let mut store = MockLatencyStore::new();
        store
            .expect_last_latency()
            .times(1)
            .returning(|_| Ok(Some(pinged("sensor-1", 4 * 60))));

        let mut device = managed("sensor-1");
        aggregator(store)
            .annotate_device(&CallContext::default(), &mut device)
            .await;
        assert_eq!(device.device_status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_single_device_never_pinged_is_offline() {
        let mut store = MockLatencyStore::new();
        store.expect_last_latency().times(1).returning(|_| Ok(None));

        let mut device = managed("sensor-1");
        aggregator(store)
            .annotate_device(&CallContext::default(), &mut device)
            .await;
        assert_eq!(device.device_status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_single_device_store_failure_degrades_to_offline() {
        let mut store = MockLatencyStore::new();
        store
            .expect_last_latency()
            .times(1)
            .returning(|_| Err(DomainError::unavailable("store down")));

        let mut device = managed("sensor-1");
        aggregator(store)
            .annotate_device(&CallContext::default(), &mut device)
            .await;
        assert_eq!(device.device_status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_group_mixed_fresh_and_stale() {
        let mut store = MockLatencyStore::new();
        store
            .expect_group_last_latencies()
            .withf(|group: &DeviceGroupId| group.device_group_id == "dg-1")
            .times(1)
            .returning(|_| Ok(vec![pinged("fresh", 30), pinged("stale", 5 * 60 * 60)]));

        let mut devices = vec![managed("fresh"), managed("stale")];
        aggregator(store)
            .annotate_group(
                &CallContext::default(),
                &DeviceGroupId::new("org-1", "dg-1"),
                &mut devices,
            )
            .await;

        assert_eq!(devices[0].device_status, DeviceStatus::Online);
        assert_eq!(devices[1].device_status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_group_fetches_once_regardless_of_size() {
        for n in [1_usize, 3, 25] {
            let mut store = MockLatencyStore::new();
            store
                .expect_group_last_latencies()
                .times(1)
                .returning(|_| Ok(vec![pinged("device-0", 10)]));
            store.expect_last_latency().never();

            let mut devices: Vec<_> = (0..n).map(|i| managed(&format!("device-{i}"))).collect();
            aggregator(store)
                .annotate_group(
                    &CallContext::default(),
                    &DeviceGroupId::new("org-1", "dg-1"),
                    &mut devices,
                )
                .await;

            assert_eq!(devices[0].device_status, DeviceStatus::Online);
            assert!(devices[1..].iter().all(|d| d.device_status == DeviceStatus::Offline));
        }
    }

    #[tokio::test]
    async fn test_group_store_failure_degrades_every_device() {
        let mut store = MockLatencyStore::new();
        store
            .expect_group_last_latencies()
            .times(1)
            .returning(|_| Err(DomainError::unavailable("store down")));

        let mut devices = vec![managed("a"), managed("b")];
        aggregator(store)
            .annotate_group(
                &CallContext::default(),
                &DeviceGroupId::new("org-1", "dg-1"),
                &mut devices,
            )
            .await;

        assert!(devices.iter().all(|d| d.device_status == DeviceStatus::Offline));
    }

    #[tokio::test]
    async fn test_empty_group_skips_store() {
        let mut store = MockLatencyStore::new();
        store.expect_group_last_latencies().never();

        let mut devices: Vec<ManagedDevice> = Vec::new();
        aggregator(store)
            .annotate_group(
                &CallContext::default(),
                &DeviceGroupId::new("org-1", "dg-1"),
                &mut devices,
            )
            .await;
    }
}
