use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller presented missing or wrong credentials.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Connectivity or availability problem with a backing store or remote service.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A device group deletion stopped part way through.
    #[error("Device group removal failed at {stage}: {source}")]
    GroupRemoval {
        stage: RemovalStage,
        source: Box<DomainError>,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Coarse classification of a [`DomainError`], used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    Unauthenticated,
    PermissionDenied,
    Unavailable,
    Unimplemented,
    Cancelled,
    Internal,
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
            Self::GroupRemoval { source, .. } => source.kind(),
        }
    }

    /// Only infrastructure failures are worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }

    /// Stage at which a group removal stopped, if this error came from one.
    pub fn removal_stage(&self) -> Option<&RemovalStage> {
        match self {
            Self::GroupRemoval { stage, .. } => Some(stage),
            _ => None,
        }
    }

    pub(crate) fn at_stage(self, stage: RemovalStage) -> Self {
        Self::GroupRemoval {
            stage,
            source: Box::new(self),
        }
    }
}

/// Stages of a device group removal, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum RemovalStage {
    Precondition,
    Disable,
    Enumerate,
    RemoveDevice {
        /// Zero-based position of the device in the enumerated list.
        index: usize,
        device_id: String,
        step: DeviceRemovalStep,
    },
    RemoveGroup {
        step: GroupRemovalStep,
    },
}

impl RemovalStage {
    pub fn wrap(self, err: DomainError) -> DomainError {
        err.at_stage(self)
    }
}

impl fmt::Display for RemovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition => write!(f, "precondition check"),
            Self::Disable => write!(f, "disable"),
            Self::Enumerate => write!(f, "device enumeration"),
            Self::RemoveDevice {
                index,
                device_id,
                step,
            } => write!(f, "device removal #{index} ({device_id}, {step})"),
            Self::RemoveGroup { step } => write!(f, "group removal ({step})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRemovalStep {
    Credentials,
    LatencyHistory,
    Catalog,
}

impl fmt::Display for DeviceRemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::LatencyHistory => write!(f, "latency history"),
            Self::Catalog => write!(f, "catalog entry"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRemovalStep {
    Credentials,
    Catalog,
}

impl fmt::Display for GroupRemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::Catalog => write!(f, "catalog entry"),
        }
    }
}
