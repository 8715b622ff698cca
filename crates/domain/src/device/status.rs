use serde::{Deserialize, Serialize};

/// Liveness of a device, derived on every read and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    /// A measurement arrived within the liveness threshold
    Online,
    /// No measurement, or the last one is older than the threshold
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::Offline
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
