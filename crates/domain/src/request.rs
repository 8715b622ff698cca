//! Inbound requests and their boundary validation.
//!
//! Every request is checked with `validate()` before any remote call is made.

use crate::device::{
    DeviceGroupId, DeviceId, Location, require_device, require_group, require_organization,
};
use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDeviceGroupRequest {
    pub organization_id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub default_device_connectivity: bool,
}

impl AddDeviceGroupRequest {
    pub fn validate(&self) -> Result<()> {
        require_organization(&self.organization_id)?;
        if self.name.is_empty() {
            return Err(DomainError::invalid_argument("name cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDeviceGroupRequest {
    pub organization_id: String,
    pub device_group_id: String,
    #[serde(default)]
    pub update_enabled: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub update_device_connectivity: bool,
    #[serde(default)]
    pub default_device_connectivity: bool,
}

impl UpdateDeviceGroupRequest {
    pub fn validate(&self) -> Result<()> {
        require_group(&self.organization_id, &self.device_group_id)?;
        if !self.update_enabled && !self.update_device_connectivity {
            return Err(DomainError::invalid_argument(
                "either update_enabled or update_device_connectivity must be set",
            ));
        }
        Ok(())
    }

    pub fn group(&self) -> DeviceGroupId {
        DeviceGroupId::new(self.organization_id.clone(), self.device_group_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDeviceRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub device_group_api_key: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub asset_info: Option<serde_json::Value>,
}

impl RegisterDeviceRequest {
    pub fn validate(&self) -> Result<()> {
        require_group(&self.organization_id, &self.device_group_id)?;
        if self.device_group_api_key.is_empty() {
            return Err(DomainError::invalid_argument(
                "device_group_api_key cannot be empty",
            ));
        }
        require_device(&self.organization_id, &self.device_group_id, &self.device_id)
    }

    pub fn device(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDeviceResponse {
    pub device_id: String,
    pub device_api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLabelRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub labels: HashMap<String, String>,
}

impl DeviceLabelRequest {
    pub fn validate(&self) -> Result<()> {
        require_device(&self.organization_id, &self.device_group_id, &self.device_id)?;
        if self.labels.is_empty() {
            return Err(DomainError::invalid_argument("labels cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDeviceRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub enabled: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

impl UpdateDeviceRequest {
    pub fn validate(&self) -> Result<()> {
        require_device(&self.organization_id, &self.device_group_id, &self.device_id)?;
        if let Some(location) = &self.location {
            if location.geolocation.is_empty() {
                return Err(DomainError::invalid_argument("location cannot be empty"));
            }
        }
        Ok(())
    }

    pub fn device(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterLatencyRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    /// Milliseconds.
    pub latency: i32,
}

impl RegisterLatencyRequest {
    pub fn validate(&self) -> Result<()> {
        require_device(&self.organization_id, &self.device_group_id, &self.device_id)?;
        if self.latency <= 0 {
            return Err(DomainError::invalid_argument(
                "latency cannot be less than zero",
            ));
        }
        Ok(())
    }

    pub fn device(&self) -> DeviceId {
        DeviceId::new(
            self.organization_id.clone(),
            self.device_group_id.clone(),
            self.device_id.clone(),
        )
    }
}

/// Validate a bare organization identifier.
pub fn validate_organization_id(organization_id: &str) -> Result<()> {
    require_organization(organization_id)
}
