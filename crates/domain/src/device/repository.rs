use super::{Device, DeviceId};
use crate::DomainError;
use crate::device_group::{DeviceGroup, DeviceGroupId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry to create for a newly registered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub asset_info: Option<serde_json::Value>,
}

/// Label change applied to an existing catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLabelUpdate {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub add_labels: bool,
    pub remove_labels: bool,
    pub labels: HashMap<String, String>,
}

/// Remote catalog of device groups and devices.
///
/// Removal calls are idempotent: removing an entity that no longer exists
/// returns `Ok(())`.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait DeviceCatalog: Send + Sync {
    async fn add_device_group(
        &self,
        organization_id: &str,
        name: &str,
        labels: HashMap<String, String>,
    ) -> Result<DeviceGroup, DomainError>;

    async fn get_device_group(&self, id: &DeviceGroupId) -> Result<DeviceGroup, DomainError>;

    async fn list_device_groups(&self, organization_id: &str)
    -> Result<Vec<DeviceGroup>, DomainError>;

    async fn remove_device_group(&self, id: &DeviceGroupId) -> Result<(), DomainError>;

    async fn add_device(&self, device: NewDevice) -> Result<Device, DomainError>;

    async fn get_device(&self, id: &DeviceId) -> Result<Device, DomainError>;

    async fn list_devices(&self, group: &DeviceGroupId) -> Result<Vec<Device>, DomainError>;

    async fn update_device(&self, update: DeviceLabelUpdate) -> Result<Device, DomainError>;

    async fn remove_device(&self, id: &DeviceId) -> Result<(), DomainError>;
}
