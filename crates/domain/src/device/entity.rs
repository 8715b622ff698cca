use super::{DeviceId, DeviceStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A device as recorded by the device catalog.
///
/// The catalog owns identity, labels and asset information; credentials and
/// liveness live elsewhere and are merged into a [`ManagedDevice`] on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    /// Registration time, epoch seconds.
    pub register_since: i64,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub asset_info: Option<serde_json::Value>,
}

impl Device {
    pub fn new(
        organization_id: String,
        device_group_id: String,
        device_id: String,
        register_since: i64,
    ) -> Self {
        Self {
            organization_id,
            device_group_id,
            device_id,
            register_since,
            labels: HashMap::new(),
            asset_info: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }
}

/// Credentials held by the credential service for a single device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub enabled: bool,
    pub device_api_key: String,
}

/// Where a device reports to be. Passed through on update, never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub geolocation: String,
}

/// The view of a device returned to callers: catalog data, credentials and
/// the liveness status computed at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedDevice {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub register_since: i64,
    pub labels: HashMap<String, String>,
    pub enabled: bool,
    pub device_api_key: String,
    pub device_status: DeviceStatus,
    pub asset_info: Option<serde_json::Value>,
    pub location: Option<Location>,
}

impl ManagedDevice {
    /// Merge catalog data with credentials. Status starts `Offline` until annotated.
    pub fn from_parts(device: Device, credentials: DeviceCredentials) -> Self {
        Self {
            organization_id: device.organization_id,
            device_group_id: device.device_group_id,
            device_id: device.device_id,
            register_since: device.register_since,
            labels: device.labels,
            enabled: credentials.enabled,
            device_api_key: credentials.device_api_key,
            device_status: DeviceStatus::Offline,
            asset_info: device.asset_info,
            location: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }
}
