use super::DeviceGroupId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A device group as recorded by the device catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub organization_id: String,
    pub device_group_id: String,
    pub name: String,
    /// Creation time, epoch seconds.
    pub created: i64,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl DeviceGroup {
    pub fn id(&self) -> DeviceGroupId {
        DeviceGroupId::new(self.organization_id.clone(), self.device_group_id.clone())
    }
}

/// Group-level credentials and connectivity defaults held by the credential service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroupCredentials {
    pub organization_id: String,
    pub device_group_id: String,
    pub enabled: bool,
    pub default_device_connectivity: bool,
    pub device_group_api_key: String,
}

/// Catalog data merged with the group credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedDeviceGroup {
    pub organization_id: String,
    pub device_group_id: String,
    pub name: String,
    pub created: i64,
    pub labels: HashMap<String, String>,
    pub enabled: bool,
    pub default_device_connectivity: bool,
    pub device_group_api_key: String,
}

impl ManagedDeviceGroup {
    pub fn from_parts(group: DeviceGroup, credentials: DeviceGroupCredentials) -> Self {
        Self {
            organization_id: group.organization_id,
            device_group_id: group.device_group_id,
            name: group.name,
            created: group.created,
            labels: group.labels,
            enabled: credentials.enabled,
            default_device_connectivity: credentials.default_device_connectivity,
            device_group_api_key: credentials.device_group_api_key,
        }
    }
}
