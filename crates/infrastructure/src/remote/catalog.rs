use std::collections::HashMap;

use async_trait::async_trait;
use domain::device::{Device, DeviceGroupId, DeviceId, DeviceLabelUpdate, NewDevice};
use domain::device_group::DeviceGroup;
use domain::{DeviceCatalog, DomainError};
use serde::Serialize;

use super::rest::RestClient;

/// Client of the device catalog service.
pub struct HttpDeviceCatalog {
    rest: RestClient,
}

#[derive(Serialize)]
struct NewGroupBody<'a> {
    name: &'a str,
    labels: HashMap<String, String>,
}

impl HttpDeviceCatalog {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

fn group_path(id: &DeviceGroupId) -> [&str; 4] {
    [
        "organizations",
        &id.organization_id,
        "device-groups",
        &id.device_group_id,
    ]
}

fn devices_path(id: &DeviceGroupId) -> [&str; 5] {
    [
        "organizations",
        &id.organization_id,
        "device-groups",
        &id.device_group_id,
        "devices",
    ]
}

fn device_path(id: &DeviceId) -> [&str; 6] {
    [
        "organizations",
        &id.organization_id,
        "device-groups",
        &id.device_group_id,
        "devices",
        &id.device_id,
    ]
}

#[async_trait]
impl DeviceCatalog for HttpDeviceCatalog {
    async fn add_device_group(
        &self,
        organization_id: &str,
        name: &str,
        labels: HashMap<String, String>,
    ) -> Result<DeviceGroup, DomainError> {
        self.rest
            .post(
                &["organizations", organization_id, "device-groups"],
                &NewGroupBody { name, labels },
            )
            .await
    }

    async fn get_device_group(&self, id: &DeviceGroupId) -> Result<DeviceGroup, DomainError> {
        self.rest.get(&group_path(id)).await
    }

    async fn list_device_groups(
        &self,
        organization_id: &str,
    ) -> Result<Vec<DeviceGroup>, DomainError> {
        self.rest
            .get(&["organizations", organization_id, "device-groups"])
            .await
    }

    async fn remove_device_group(&self, id: &DeviceGroupId) -> Result<(), DomainError> {
        self.rest.delete(&group_path(id)).await
    }

    async fn add_device(&self, device: NewDevice) -> Result<Device, DomainError> {
        let group = DeviceGroupId::new(
            device.organization_id.clone(),
            device.device_group_id.clone(),
        );
        self.rest.post(&devices_path(&group), &device).await
    }

    async fn get_device(&self, id: &DeviceId) -> Result<Device, DomainError> {
        self.rest.get(&device_path(id)).await
    }

    async fn list_devices(&self, group: &DeviceGroupId) -> Result<Vec<Device>, DomainError> {
        self.rest.get(&devices_path(group)).await
    }

    async fn update_device(&self, update: DeviceLabelUpdate) -> Result<Device, DomainError> {
        let id = DeviceId::new(
            update.organization_id.clone(),
            update.device_group_id.clone(),
            update.device_id.clone(),
        );
        self.rest.patch(&device_path(&id), &update).await
    }

    async fn remove_device(&self, id: &DeviceId) -> Result<(), DomainError> {
        self.rest.delete(&device_path(id)).await
    }
}
