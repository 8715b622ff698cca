mod group_removal;
mod manager;

pub use manager::DeviceManager;
