//! Application layer - Use cases and business workflows

pub mod context;
pub mod device;
pub mod latency;
pub mod status;

pub use context::CallContext;
pub use device::DeviceManager;
pub use latency::LatencyManager;
pub use status::StatusAggregator;
