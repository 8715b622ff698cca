mod entity;
mod liveness;
mod store;

pub use entity::{DEFAULT_RETENTION, Latency};
pub use liveness::{LivenessPolicy, classify};
#[cfg(any(test, feature = "mocks"))]
pub use store::MockLatencyStore;
pub use store::LatencyStore;
