use crate::DomainError;
use crate::device::{DeviceCredentials, DeviceId};
use crate::device_group::{DeviceGroupCredentials, DeviceGroupId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeviceGroupCredentials {
    pub organization_id: String,
    pub device_group_id: String,
    pub enabled: bool,
    pub default_device_connectivity: bool,
}

/// Partial update of group credentials; each `update_*` flag selects whether
/// the matching value is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroupCredentialsUpdate {
    pub organization_id: String,
    pub device_group_id: String,
    pub update_enabled: bool,
    pub enabled: bool,
    pub update_device_connectivity: bool,
    pub default_device_connectivity: bool,
}

impl DeviceGroupCredentialsUpdate {
    /// Turns the group off and stops new devices from connecting by default.
    pub fn disable(group: &DeviceGroupId) -> Self {
        Self {
            organization_id: group.organization_id.clone(),
            device_group_id: group.device_group_id.clone(),
            update_enabled: true,
            enabled: false,
            update_device_connectivity: true,
            default_device_connectivity: false,
        }
    }
}

/// Remote credential (authx) service.
///
/// Removal calls are idempotent: revoking credentials that no longer exist
/// returns `Ok(())`.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CredentialService: Send + Sync {
    async fn add_device_group_credentials(
        &self,
        request: NewDeviceGroupCredentials,
    ) -> Result<DeviceGroupCredentials, DomainError>;

    async fn update_device_group_credentials(
        &self,
        update: DeviceGroupCredentialsUpdate,
    ) -> Result<(), DomainError>;

    async fn remove_device_group_credentials(&self, id: &DeviceGroupId)
    -> Result<(), DomainError>;

    async fn get_device_group_credentials(
        &self,
        id: &DeviceGroupId,
    ) -> Result<DeviceGroupCredentials, DomainError>;

    async fn add_device_credentials(&self, id: &DeviceId)
    -> Result<DeviceCredentials, DomainError>;

    async fn update_device_credentials(&self, id: &DeviceId, enabled: bool)
    -> Result<(), DomainError>;

    async fn remove_device_credentials(&self, id: &DeviceId) -> Result<(), DomainError>;

    async fn get_device_credentials(&self, id: &DeviceId)
    -> Result<DeviceCredentials, DomainError>;

    /// Checks that `device_group_api_key` is a valid login for a group of the organization.
    async fn device_group_login(
        &self,
        organization_id: &str,
        device_group_api_key: &str,
    ) -> Result<(), DomainError>;
}
