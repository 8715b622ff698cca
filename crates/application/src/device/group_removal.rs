use std::fmt;

use domain::credentials::DeviceGroupCredentialsUpdate;
use domain::device::{DeviceGroupId, DeviceId};
use domain::{DeviceRemovalStep, DomainError, GroupRemovalStep, RemovalStage};
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::device::manager::DeviceManager;

/// Progress of one group removal. Transitions are strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalState {
    Start,
    PreconditionChecked,
    Disabled,
    DevicesEnumerated { total: usize },
    DevicesRemoved,
    GroupRemoved,
}

impl fmt::Display for RemovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::PreconditionChecked => write!(f, "precondition checked"),
            Self::Disabled => write!(f, "disabled"),
            Self::DevicesEnumerated { total } => write!(f, "{total} devices enumerated"),
            Self::DevicesRemoved => write!(f, "devices removed"),
            Self::GroupRemoved => write!(f, "group removed"),
        }
    }
}

/// One run of the cascading removal of a device group.
///
/// Lives only for the duration of the call; nothing about its progress is
/// persisted. Every step is idempotent on the collaborator side, so a failed
/// removal is retried by calling it again from the start.
pub(crate) struct GroupRemoval<'a> {
    manager: &'a DeviceManager,
    ctx: &'a CallContext,
    group: &'a DeviceGroupId,
    state: RemovalState,
}

impl<'a> GroupRemoval<'a> {
    pub(crate) fn new(
        manager: &'a DeviceManager,
        ctx: &'a CallContext,
        group: &'a DeviceGroupId,
    ) -> Self {
        Self {
            manager,
            ctx,
            group,
            state: RemovalState::Start,
        }
    }

    pub(crate) async fn run(mut self) -> Result<(), DomainError> {
        let result = self.execute().await;
        match &result {
            Ok(()) => info!(device_group = %self.group, "Device group removed"),
            Err(e) => warn!(
                device_group = %self.group,
                reached = %self.state,
                error = %e,
                "Device group removal stopped"
            ),
        }
        result
    }

    async fn execute(&mut self) -> Result<(), DomainError> {
        self.check_precondition().await?;
        self.advance(RemovalState::PreconditionChecked);

        self.disable().await?;
        self.advance(RemovalState::Disabled);

        let devices = self.enumerate().await?;
        self.advance(RemovalState::DevicesEnumerated {
            total: devices.len(),
        });

        for (index, device) in devices.iter().enumerate() {
            self.remove_device(index, device).await?;
        }
        self.advance(RemovalState::DevicesRemoved);

        self.remove_group().await?;
        self.advance(RemovalState::GroupRemoved);
        Ok(())
    }

    fn advance(&mut self, next: RemovalState) {
        debug!(
            device_group = %self.group,
            from = %self.state,
            to = %next,
            "Group removal progressed"
        );
        self.state = next;
    }

    /// Read-only: refuses the removal while an application still grants
    /// access to the group.
    async fn check_precondition(&self) -> Result<(), DomainError> {
        let descriptors = self
            .ctx
            .call(
                "list app descriptors",
                self.manager
                    .applications
                    .list_app_descriptors(&self.group.organization_id),
            )
            .await
            .map_err(|e| RemovalStage::Precondition.wrap(e))?;

        let linked: Vec<&str> = descriptors
            .iter()
            .filter(|d| d.references_device_group(&self.group.device_group_id))
            .map(|d| d.app_descriptor_id.as_str())
            .collect();

        if !linked.is_empty() {
            let blocked = DomainError::FailedPrecondition(format!(
                "device group {} is referenced by application descriptors [{}]",
                self.group,
                linked.join(", ")
            ));
            return Err(RemovalStage::Precondition.wrap(blocked));
        }
        Ok(())
    }

    async fn disable(&self) -> Result<(), DomainError> {
        self.ctx
            .call(
                "disable device group",
                self.manager
                    .credentials
                    .update_device_group_credentials(DeviceGroupCredentialsUpdate::disable(
                        self.group,
                    )),
            )
            .await
            .map_err(|e| RemovalStage::Disable.wrap(e))
    }

    async fn enumerate(&self) -> Result<Vec<DeviceId>, DomainError> {
        let devices = self
            .ctx
            .call("list devices", self.manager.catalog.list_devices(self.group))
            .await
            .map_err(|e| RemovalStage::Enumerate.wrap(e))?;
        Ok(devices.iter().map(|d| d.id()).collect())
    }

    async fn remove_device(&self, index: usize, device: &DeviceId) -> Result<(), DomainError> {
        let stage = |step| RemovalStage::RemoveDevice {
            index,
            device_id: device.device_id.clone(),
            step,
        };

        self.ctx
            .call(
                "remove device credentials",
                self.manager.credentials.remove_device_credentials(device),
            )
            .await
            .map_err(|e| stage(DeviceRemovalStep::Credentials).wrap(e))?;

        self.ctx
            .call(
                "remove device latencies",
                self.manager.latencies.remove_latencies(device),
            )
            .await
            .map_err(|e| stage(DeviceRemovalStep::LatencyHistory).wrap(e))?;

        self.ctx
            .call("remove device", self.manager.catalog.remove_device(device))
            .await
            .map_err(|e| stage(DeviceRemovalStep::Catalog).wrap(e))?;

        debug!(device = %device, index, "Device removed as part of its group");
        Ok(())
    }

    async fn remove_group(&self) -> Result<(), DomainError> {
        self.ctx
            .call(
                "remove device group credentials",
                self.manager
                    .credentials
                    .remove_device_group_credentials(self.group),
            )
            .await
            .map_err(|e| {
                RemovalStage::RemoveGroup {
                    step: GroupRemovalStep::Credentials,
                }
                .wrap(e)
            })?;

        self.ctx
            .call(
                "remove device group",
                self.manager.catalog.remove_device_group(self.group),
            )
            .await
            .map_err(|e| {
                RemovalStage::RemoveGroup {
                    step: GroupRemovalStep::Catalog,
                }
                .wrap(e)
            })
    }
}
