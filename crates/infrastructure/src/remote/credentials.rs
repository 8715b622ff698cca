use async_trait::async_trait;
use domain::credentials::{DeviceGroupCredentialsUpdate, NewDeviceGroupCredentials};
use domain::device::{DeviceCredentials, DeviceGroupId, DeviceId};
use domain::device_group::DeviceGroupCredentials;
use domain::{CredentialService, DomainError};
use serde::Serialize;

use super::rest::RestClient;

/// Client of the credential (authx) service.
pub struct HttpCredentialService {
    rest: RestClient,
}

#[derive(Serialize)]
struct EnabledBody {
    enabled: bool,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    organization_id: &'a str,
    device_group_api_key: &'a str,
}

impl HttpCredentialService {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

fn group_path(id: &DeviceGroupId) -> [&str; 3] {
    ["device-groups", &id.organization_id, &id.device_group_id]
}

fn device_path(id: &DeviceId) -> [&str; 5] {
    [
        "device-groups",
        &id.organization_id,
        &id.device_group_id,
        "devices",
        &id.device_id,
    ]
}

#[async_trait]
impl CredentialService for HttpCredentialService {
    async fn add_device_group_credentials(
        &self,
        request: NewDeviceGroupCredentials,
    ) -> Result<DeviceGroupCredentials, DomainError> {
        self.rest.post(&["device-groups"], &request).await
    }

    async fn update_device_group_credentials(
        &self,
        update: DeviceGroupCredentialsUpdate,
    ) -> Result<(), DomainError> {
        let id = DeviceGroupId::new(
            update.organization_id.clone(),
            update.device_group_id.clone(),
        );
        self.rest.put(&group_path(&id), &update).await
    }

    async fn remove_device_group_credentials(
        &self,
        id: &DeviceGroupId,
    ) -> Result<(), DomainError> {
        self.rest.delete(&group_path(id)).await
    }

    async fn get_device_group_credentials(
        &self,
        id: &DeviceGroupId,
    ) -> Result<DeviceGroupCredentials, DomainError> {
        self.rest.get(&group_path(id)).await
    }

    async fn add_device_credentials(
        &self,
        id: &DeviceId,
    ) -> Result<DeviceCredentials, DomainError> {
        self.rest
            .post(&device_path(id), &EnabledBody { enabled: true })
            .await
    }

    async fn update_device_credentials(
        &self,
        id: &DeviceId,
        enabled: bool,
    ) -> Result<(), DomainError> {
        self.rest
            .put(&device_path(id), &EnabledBody { enabled })
            .await
    }

    async fn remove_device_credentials(&self, id: &DeviceId) -> Result<(), DomainError> {
        self.rest.delete(&device_path(id)).await
    }

    async fn get_device_credentials(
        &self,
        id: &DeviceId,
    ) -> Result<DeviceCredentials, DomainError> {
        self.rest.get(&device_path(id)).await
    }

    async fn device_group_login(
        &self,
        organization_id: &str,
        device_group_api_key: &str,
    ) -> Result<(), DomainError> {
        self.rest
            .post_empty(
                &["login", "device-group"],
                &LoginBody {
                    organization_id,
                    device_group_api_key,
                },
            )
            .await
    }
}
