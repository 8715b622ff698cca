use crate::DomainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who may reach a port exposed by an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortAccess {
    AllAppServices,
    AppServices,
    Public,
    DeviceGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub rule_id: String,
    pub access: PortAccess,
    /// Only meaningful when `access` is [`PortAccess::DeviceGroup`].
    #[serde(default)]
    pub device_group_ids: Vec<String>,
}

impl SecurityRule {
    pub fn grants_device_group(&self, device_group_id: &str) -> bool {
        self.access == PortAccess::DeviceGroup
            && self.device_group_ids.iter().any(|id| id == device_group_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub organization_id: String,
    pub app_descriptor_id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
}

impl AppDescriptor {
    pub fn references_device_group(&self, device_group_id: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.grants_device_group(device_group_id))
    }
}

/// Read-only view of the remote application catalog.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ApplicationCatalog: Send + Sync {
    async fn list_app_descriptors(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AppDescriptor>, DomainError>;
}
