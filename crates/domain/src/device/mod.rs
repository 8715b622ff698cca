mod device_id;
mod entity;
mod repository;
mod status;

pub use device_id::{DeviceGroupId, DeviceId};
pub(crate) use device_id::{require_device, require_group, require_organization};
pub use entity::{Device, DeviceCredentials, Location, ManagedDevice};
#[cfg(any(test, feature = "mocks"))]
pub use repository::MockDeviceCatalog;
pub use repository::{DeviceCatalog, DeviceLabelUpdate, NewDevice};
pub use status::DeviceStatus;
