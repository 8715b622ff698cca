use super::Latency;
use crate::device::DeviceStatus;
use std::time::Duration;

/// Classify a device from its most recent measurement.
///
/// A device is online while `inserted_at + threshold` is strictly after `now`;
/// a device that never pinged is offline.
pub fn classify(last: Option<&Latency>, threshold: Duration, now: i64) -> DeviceStatus {
    let Some(latency) = last else {
        return DeviceStatus::Offline;
    };

    let threshold_secs = i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX);
    let deadline = latency.inserted_at.saturating_add(threshold_secs);
    if deadline > now {
        DeviceStatus::Online
    } else {
        DeviceStatus::Offline
    }
}

/// Service-wide liveness threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    threshold: Duration,
}

impl LivenessPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn classify(&self, last: Option<&Latency>, now: i64) -> DeviceStatus {
        classify(last, self.threshold, now)
    }
}
