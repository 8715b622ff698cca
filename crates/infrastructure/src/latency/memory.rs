use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use domain::device::{DeviceGroupId, DeviceId};
use domain::latency::{DEFAULT_RETENTION, Latency, LatencyStore};
use domain::DomainError;

use super::now;

/// Seconds between two sweeps of every device's rows.
const PURGE_INTERVAL_SECS: i64 = 60;

#[derive(Default)]
struct Tables {
    history: HashMap<DeviceId, Vec<Latency>>,
    last: HashMap<DeviceId, Latency>,
    last_purge: i64,
}

impl Tables {
    /// Full sweep, at most once per [`PURGE_INTERVAL_SECS`].
    fn purge_if_due(&mut self, retention: Duration, now: i64) {
        if now - self.last_purge < PURGE_INTERVAL_SECS {
            return;
        }
        self.last_purge = now;
        self.history.retain(|_, entries| {
            trim_expired(entries, retention, now);
            !entries.is_empty()
        });
        self.last.retain(|_, l| !l.is_expired(retention, now));
    }
}

/// History is ordered by `inserted_at`, so expired rows form a prefix.
fn trim_expired(entries: &mut Vec<Latency>, retention: Duration, now: i64) {
    let expired = entries.partition_point(|l| l.is_expired(retention, now));
    entries.drain(..expired);
}

/// Process-local latency store, used for development and tests.
///
/// One lock covers both tables. Expired rows are hidden on read; a write trims
/// the written device and sweeps the rest on an interval.
pub struct InMemoryLatencyStore {
    tables: Mutex<Tables>,
    retention: Duration,
}

impl InMemoryLatencyStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            retention,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, DomainError> {
        self.tables
            .lock()
            .map_err(|_| DomainError::Internal("latency store lock poisoned".to_string()))
    }
}

impl Default for InMemoryLatencyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LatencyStore for InMemoryLatencyStore {
    async fn record(&self, latency: Latency) -> Result<(), DomainError> {
        let now = now();
        let mut tables = self.lock()?;
        tables.purge_if_due(self.retention, now);

        let id = latency.device();
        let newer = tables
            .last
            .get(&id)
            .is_none_or(|current| latency.inserted_at >= current.inserted_at);
        if newer {
            tables.last.insert(id.clone(), latency.clone());
        }

        let history = tables.history.entry(id).or_default();
        trim_expired(history, self.retention, now);
        let at = history.partition_point(|l| l.inserted_at <= latency.inserted_at);
        history.insert(at, latency);
        Ok(())
    }

    async fn last_latency(&self, device: &DeviceId) -> Result<Option<Latency>, DomainError> {
        let now = now();
        let tables = self.lock()?;
        Ok(tables
            .last
            .get(device)
            .filter(|l| !l.is_expired(self.retention, now))
            .cloned())
    }

    async fn group_last_latencies(
        &self,
        group: &DeviceGroupId,
    ) -> Result<Vec<Latency>, DomainError> {
        let now = now();
        let tables = self.lock()?;
        let mut result: Vec<Latency> = tables
            .last
            .values()
            .filter(|l| {
                l.organization_id == group.organization_id
                    && l.device_group_id == group.device_group_id
                    && !l.is_expired(self.retention, now)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(result)
    }

    async fn history(&self, device: &DeviceId) -> Result<Vec<Latency>, DomainError> {
        let now = now();
        let tables = self.lock()?;
        Ok(tables
            .history
            .get(device)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|l| !l.is_expired(self.retention, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn remove_latencies(&self, device: &DeviceId) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        tables.history.remove(device);
        tables.last.remove(device);
        Ok(())
    }
}
