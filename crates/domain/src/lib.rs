//! Domain layer - Pure device-management types and ports
//!
//! This crate contains:
//! - Identifiers and catalog records (DeviceId, Device, DeviceGroup)
//! - Latency measurements and the liveness classifier
//! - Inbound requests with boundary validation
//! - Port traits for the latency store and the remote collaborators
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Liveness is a pure function of (last measurement, threshold, now)
//! - Testable in isolation

pub mod application_catalog;
pub mod credentials;
pub mod device;
pub mod device_group;
pub mod error;
pub mod latency;
pub mod request;

// Re-export commonly used types
pub use application_catalog::{AppDescriptor, ApplicationCatalog, PortAccess, SecurityRule};
pub use credentials::CredentialService;
pub use device::{DeviceCatalog, DeviceGroupId, DeviceId, DeviceStatus};
pub use error::{DeviceRemovalStep, DomainError, ErrorKind, GroupRemovalStep, RemovalStage};
pub use latency::{Latency, LatencyStore, LivenessPolicy};
