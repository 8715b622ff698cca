use std::sync::Arc;

use domain::credentials::{DeviceGroupCredentialsUpdate, NewDeviceGroupCredentials};
use domain::device::{
    DeviceCatalog, DeviceGroupId, DeviceId, DeviceLabelUpdate, ManagedDevice, NewDevice,
};
use domain::device_group::{DeviceGroup, ManagedDeviceGroup};
use domain::request::{
    AddDeviceGroupRequest, DeviceLabelRequest, RegisterDeviceRequest, RegisterDeviceResponse,
    UpdateDeviceGroupRequest, UpdateDeviceRequest, validate_organization_id,
};
use domain::{ApplicationCatalog, CredentialService, DomainError, LatencyStore};
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::device::group_removal::GroupRemoval;
use crate::status::StatusAggregator;

/// Device and device group use cases.
///
/// Composes the credential service, the device catalog and the latency store
/// into the views returned to callers. Every call takes the [`CallContext`]
/// of the inbound request so all remote sub-calls share its deadline.
pub struct DeviceManager {
    pub(crate) credentials: Arc<dyn CredentialService>,
    pub(crate) catalog: Arc<dyn DeviceCatalog>,
    pub(crate) applications: Arc<dyn ApplicationCatalog>,
    pub(crate) latencies: Arc<dyn LatencyStore>,
    status: StatusAggregator,
}

impl DeviceManager {
    pub fn new(
        credentials: Arc<dyn CredentialService>,
        catalog: Arc<dyn DeviceCatalog>,
        applications: Arc<dyn ApplicationCatalog>,
        latencies: Arc<dyn LatencyStore>,
        status: StatusAggregator,
    ) -> Self {
        Self {
            credentials,
            catalog,
            applications,
            latencies,
            status,
        }
    }

    // --- Device groups ---

    pub async fn add_device_group(
        &self,
        ctx: &CallContext,
        request: AddDeviceGroupRequest,
    ) -> Result<ManagedDeviceGroup, DomainError> {
        request.validate()?;

        let added = ctx
            .call(
                "add device group",
                self.catalog.add_device_group(
                    &request.organization_id,
                    &request.name,
                    Default::default(),
                ),
            )
            .await?;

        let credentials = ctx
            .call(
                "add device group credentials",
                self.credentials
                    .add_device_group_credentials(NewDeviceGroupCredentials {
                        organization_id: added.organization_id.clone(),
                        device_group_id: added.device_group_id.clone(),
                        enabled: request.enabled,
                        default_device_connectivity: request.default_device_connectivity,
                    }),
            )
            .await?;

        info!(device_group = %added.id(), name = %added.name, "Device group added");
        Ok(ManagedDeviceGroup::from_parts(added, credentials))
    }

    pub async fn get_device_group(
        &self,
        ctx: &CallContext,
        id: &DeviceGroupId,
    ) -> Result<ManagedDeviceGroup, DomainError> {
        id.validate()?;
        let group = ctx
            .call("get device group", self.catalog.get_device_group(id))
            .await?;
        self.with_group_credentials(ctx, group).await
    }

    pub async fn update_device_group(
        &self,
        ctx: &CallContext,
        request: UpdateDeviceGroupRequest,
    ) -> Result<ManagedDeviceGroup, DomainError> {
        request.validate()?;
        let group = request.group();

        ctx.call(
            "update device group credentials",
            self.credentials
                .update_device_group_credentials(DeviceGroupCredentialsUpdate {
                    organization_id: request.organization_id,
                    device_group_id: request.device_group_id,
                    update_enabled: request.update_enabled,
                    enabled: request.enabled,
                    update_device_connectivity: request.update_device_connectivity,
                    default_device_connectivity: request.default_device_connectivity,
                }),
        )
        .await?;

        debug!(device_group = %group, "Device group credentials updated");
        self.get_device_group(ctx, &group).await
    }

    pub async fn list_device_groups(
        &self,
        ctx: &CallContext,
        organization_id: &str,
    ) -> Result<Vec<ManagedDeviceGroup>, DomainError> {
        validate_organization_id(organization_id)?;
        let groups = ctx
            .call(
                "list device groups",
                self.catalog.list_device_groups(organization_id),
            )
            .await?;

        let mut result = Vec::with_capacity(groups.len());
        for group in groups {
            result.push(self.with_group_credentials(ctx, group).await?);
        }
        Ok(result)
    }

    /// Remove a device group together with every device in it.
    ///
    /// Refused with `FailedPrecondition`, at the precondition stage, while an
    /// application descriptor still grants access to the group. Otherwise the
    /// group is disabled and its devices removed one by one before the group
    /// itself; a failure stops the removal and names the stage it happened at.
    /// Devices removed before the failure stay removed.
    pub async fn remove_device_group(
        &self,
        ctx: &CallContext,
        id: &DeviceGroupId,
    ) -> Result<(), DomainError> {
        id.validate()?;
        GroupRemoval::new(self, ctx, id).run().await
    }

    async fn with_group_credentials(
        &self,
        ctx: &CallContext,
        group: DeviceGroup,
    ) -> Result<ManagedDeviceGroup, DomainError> {
        let id = group.id();
        let credentials = ctx
            .call(
                "get device group credentials",
                self.credentials.get_device_group_credentials(&id),
            )
            .await?;
        Ok(ManagedDeviceGroup::from_parts(group, credentials))
    }

    // --- Devices ---

    /// Register a device after checking the group API key it presented.
    pub async fn register_device(
        &self,
        ctx: &CallContext,
        request: RegisterDeviceRequest,
    ) -> Result<RegisterDeviceResponse, DomainError> {
        request.validate()?;
        let id = request.device();

        ctx.call(
            "device group login",
            self.credentials
                .device_group_login(&request.organization_id, &request.device_group_api_key),
        )
        .await?;
        debug!(device = %id, "Device group login accepted");

        let added = ctx
            .call(
                "add device",
                self.catalog.add_device(NewDevice {
                    organization_id: request.organization_id,
                    device_group_id: request.device_group_id,
                    device_id: request.device_id,
                    labels: request.labels,
                    asset_info: request.asset_info,
                }),
            )
            .await?;

        let credentials = match ctx
            .call(
                "add device credentials",
                self.credentials.add_device_credentials(&id),
            )
            .await
        {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(
                    device = %id,
                    error = %e,
                    "Device added to catalog but credentials could not be created"
                );
                return Err(e);
            }
        };

        info!(device = %added.id(), "Device registered");
        Ok(RegisterDeviceResponse {
            device_id: credentials.device_id,
            device_api_key: credentials.device_api_key,
        })
    }

    pub async fn get_device(
        &self,
        ctx: &CallContext,
        id: &DeviceId,
    ) -> Result<ManagedDevice, DomainError> {
        id.validate()?;
        let device = ctx.call("get device", self.catalog.get_device(id)).await?;
        let credentials = ctx
            .call(
                "get device credentials",
                self.credentials.get_device_credentials(id),
            )
            .await?;

        let mut managed = ManagedDevice::from_parts(device, credentials);
        self.status.annotate_device(ctx, &mut managed).await;
        Ok(managed)
    }

    /// Devices of a group with credentials and liveness status.
    pub async fn list_devices(
        &self,
        ctx: &CallContext,
        group: &DeviceGroupId,
    ) -> Result<Vec<ManagedDevice>, DomainError> {
        group.validate()?;
        let devices = ctx
            .call("list devices", self.catalog.list_devices(group))
            .await?;

        let mut result = Vec::with_capacity(devices.len());
        for device in devices {
            let id = device.id();
            let credentials = ctx
                .call(
                    "get device credentials",
                    self.credentials.get_device_credentials(&id),
                )
                .await?;
            result.push(ManagedDevice::from_parts(device, credentials));
        }

        self.status.annotate_group(ctx, group, &mut result).await;
        Ok(result)
    }

    /// Update the `enabled` flag of a device and return its fresh view.
    pub async fn update_device(
        &self,
        ctx: &CallContext,
        request: UpdateDeviceRequest,
    ) -> Result<ManagedDevice, DomainError> {
        request.validate()?;
        let id = request.device();

        ctx.call(
            "update device credentials",
            self.credentials
                .update_device_credentials(&id, request.enabled),
        )
        .await?;

        let mut device = self.get_device(ctx, &id).await?;
        device.location = request.location;
        Ok(device)
    }

    /// Remove a single device.
    ///
    /// Credential and latency cleanup is best-effort; the catalog removal
    /// decides the outcome.
    pub async fn remove_device(&self, ctx: &CallContext, id: &DeviceId) -> Result<(), DomainError> {
        id.validate()?;

        if let Err(e) = ctx
            .call(
                "remove device credentials",
                self.credentials.remove_device_credentials(id),
            )
            .await
        {
            warn!(
                device = %id,
                error = %e,
                "Device may be partially removed. Cannot remove credentials"
            );
        }

        if let Err(e) = ctx
            .call(
                "remove device latencies",
                self.latencies.remove_latencies(id),
            )
            .await
        {
            warn!(
                device = %id,
                error = %e,
                "Device may be partially removed. Cannot remove latencies"
            );
        }

        ctx.call("remove device", self.catalog.remove_device(id)).await?;
        info!(device = %id, "Device removed");
        Ok(())
    }

    pub async fn add_label_to_device(
        &self,
        ctx: &CallContext,
        request: DeviceLabelRequest,
    ) -> Result<(), DomainError> {
        self.update_labels(ctx, request, true).await
    }

    pub async fn remove_label_from_device(
        &self,
        ctx: &CallContext,
        request: DeviceLabelRequest,
    ) -> Result<(), DomainError> {
        self.update_labels(ctx, request, false).await
    }

    async fn update_labels(
        &self,
        ctx: &CallContext,
        request: DeviceLabelRequest,
        add: bool,
    ) -> Result<(), DomainError> {
        request.validate()?;
        ctx.call(
            "update device labels",
            self.catalog.update_device(DeviceLabelUpdate {
                organization_id: request.organization_id,
                device_group_id: request.device_group_id,
                device_id: request.device_id,
                add_labels: add,
                remove_labels: !add,
                labels: request.labels,
            }),
        )
        .await?;
        Ok(())
    }
}
