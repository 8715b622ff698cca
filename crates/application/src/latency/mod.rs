mod manager;

pub use manager::LatencyManager;
