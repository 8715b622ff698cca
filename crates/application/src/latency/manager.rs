use std::sync::Arc;

use domain::device::{DeviceGroupId, DeviceId};
use domain::latency::{Latency, LatencyStore};
use domain::request::RegisterLatencyRequest;
use domain::DomainError;
use tracing::trace;

use crate::context::CallContext;

/// Ping ingestion and the reserved latency read surface.
pub struct LatencyManager {
    store: Arc<dyn LatencyStore>,
}

impl LatencyManager {
    pub fn new(store: Arc<dyn LatencyStore>) -> Self {
        Self { store }
    }

    /// Record one ping, stamped with the current time.
    pub async fn register_latency(
        &self,
        ctx: &CallContext,
        request: RegisterLatencyRequest,
    ) -> Result<(), DomainError> {
        request.validate()?;
        let device = request.device();
        let latency = Latency::new(&device, request.latency, chrono::Utc::now().timestamp())?;

        ctx.call("record latency", self.store.record(latency)).await?;
        trace!(device = %device, latency_ms = request.latency, "Latency recorded");
        Ok(())
    }

    pub async fn device_latencies(
        &self,
        _ctx: &CallContext,
        device: &DeviceId,
    ) -> Result<Vec<Latency>, DomainError> {
        device.validate()?;
        Err(DomainError::Unimplemented(
            "device latency history is not available".to_string(),
        ))
    }

    pub async fn group_latencies(
        &self,
        _ctx: &CallContext,
        group: &DeviceGroupId,
    ) -> Result<Vec<Latency>, DomainError> {
        group.validate()?;
        Err(DomainError::Unimplemented(
            "device group latency history is not available".to_string(),
        ))
    }
}
