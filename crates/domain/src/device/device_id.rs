use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

const EMPTY_ORGANIZATION_ID: &str = "organization_id cannot be empty";
const EMPTY_DEVICE_GROUP_ID: &str = "device_group_id cannot be empty";
const EMPTY_DEVICE_ID: &str = "device_id cannot be empty";

pub(crate) fn require_organization(organization_id: &str) -> Result<()> {
    if organization_id.is_empty() {
        return Err(DomainError::invalid_argument(EMPTY_ORGANIZATION_ID));
    }
    Ok(())
}

pub(crate) fn require_group(organization_id: &str, device_group_id: &str) -> Result<()> {
    require_organization(organization_id)?;
    if device_group_id.is_empty() {
        return Err(DomainError::invalid_argument(EMPTY_DEVICE_GROUP_ID));
    }
    Ok(())
}

pub(crate) fn require_device(
    organization_id: &str,
    device_group_id: &str,
    device_id: &str,
) -> Result<()> {
    require_group(organization_id, device_group_id)?;
    if device_id.is_empty() {
        return Err(DomainError::invalid_argument(EMPTY_DEVICE_ID));
    }
    Ok(())
}

/// Identifies a device group inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceGroupId {
    pub organization_id: String,
    pub device_group_id: String,
}

impl DeviceGroupId {
    pub fn new(organization_id: impl Into<String>, device_group_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            device_group_id: device_group_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_group(&self.organization_id, &self.device_group_id)
    }

    /// Identifier of a device belonging to this group.
    pub fn device(&self, device_id: impl Into<String>) -> DeviceId {
        DeviceId {
            organization_id: self.organization_id.clone(),
            device_group_id: self.device_group_id.clone(),
            device_id: device_id.into(),
        }
    }
}

impl std::fmt::Display for DeviceGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.device_group_id)
    }
}

/// Identifies a device: `(organization, device group, device)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
}

impl DeviceId {
    pub fn new(
        organization_id: impl Into<String>,
        device_group_id: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            device_group_id: device_group_id.into(),
            device_id: device_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_device(&self.organization_id, &self.device_group_id, &self.device_id)
    }

    pub fn group(&self) -> DeviceGroupId {
        DeviceGroupId::new(self.organization_id.clone(), self.device_group_id.clone())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.organization_id, self.device_group_id, self.device_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_device_id() {
        let id = DeviceId::new("org-1", "dg-1", "sensor-1");
        assert!(id.validate().is_ok());
        assert_eq!(id.to_string(), "org-1/dg-1/sensor-1");
        assert_eq!(id.group(), DeviceGroupId::new("org-1", "dg-1"));
    }

    #[test]
    fn test_empty_parts_are_rejected_in_order() {
        let err = DeviceId::new("", "", "").validate().unwrap_err();
        assert_eq!(err, DomainError::invalid_argument(EMPTY_ORGANIZATION_ID));

        let err = DeviceId::new("org-1", "", "sensor-1").validate().unwrap_err();
        assert_eq!(err, DomainError::invalid_argument(EMPTY_DEVICE_GROUP_ID));

        let err = DeviceId::new("org-1", "dg-1", "").validate().unwrap_err();
        assert_eq!(err, DomainError::invalid_argument(EMPTY_DEVICE_ID));
    }

    #[test]
    fn test_group_builds_device_ids() {
        let group = DeviceGroupId::new("org-1", "dg-1");
        assert!(group.validate().is_ok());
        assert_eq!(group.device("d"), DeviceId::new("org-1", "dg-1", "d"));
    }
}
