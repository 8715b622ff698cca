mod entity;

pub use crate::device::DeviceGroupId;
pub use entity::{DeviceGroup, DeviceGroupCredentials, ManagedDeviceGroup};
