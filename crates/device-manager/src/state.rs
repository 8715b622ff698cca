use std::sync::Arc;
use std::time::Duration;

use application::{CallContext, DeviceManager, LatencyManager};
use infrastructure::SqliteLatencyStore;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub devices: DeviceManager,
    pub latencies: LatencyManager,
    pub call_timeout: Duration,
    pub request_deadline: Duration,
    /// Present when the SQLite backend is in use, so shutdown can close it.
    pub sqlite: Option<Arc<SqliteLatencyStore>>,
    /// Parent of every request's token; cancelled when the server stops.
    in_flight: CancellationToken,
}

impl AppState {
    pub fn new(
        devices: DeviceManager,
        latencies: LatencyManager,
        call_timeout: Duration,
        request_deadline: Duration,
    ) -> Self {
        Self {
            devices,
            latencies,
            call_timeout,
            request_deadline,
            sqlite: None,
            in_flight: CancellationToken::new(),
        }
    }

    /// Fresh deadline scope for one inbound request.
    pub fn context(&self) -> CallContext {
        CallContext::new(self.request_deadline, self.call_timeout)
            .with_cancellation(self.in_flight.child_token())
    }

    /// Abort the remote calls of every request still running.
    pub fn cancel_in_flight(&self) {
        self.in_flight.cancel();
    }

    pub async fn shutdown(&self) {
        if let Some(store) = &self.sqlite {
            store.close().await;
        }
    }
}
