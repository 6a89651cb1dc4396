//! Health verdicts for a Stage's current Freight.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The state component of a health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    /// All deployment targets are synced to the current Freight and report
    /// healthy.
    Healthy,
    /// At least one deployment target reports degraded or out of sync.
    Unhealthy,
    /// Deployment targets are still converging.
    Progressing,
    /// The verdict could not be determined.
    Unknown,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::Unhealthy => write!(f, "Unhealthy"),
            Self::Progressing => write!(f, "Progressing"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A health verdict, optionally with the reason behind it.
///
/// Anything other than `Healthy` means new Freight is not qualified for
/// downstream Stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// The verdict.
    pub status: HealthState,
    /// Human-readable explanation, populated for non-healthy verdicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
}

impl Health {
    /// A healthy verdict.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: HealthState::Healthy,
            status_reason: None,
        }
    }

    /// An unhealthy verdict with a reason.
    #[must_use]
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            status: HealthState::Unhealthy,
            status_reason: Some(reason.into()),
        }
    }

    /// A progressing verdict.
    #[must_use]
    pub fn progressing() -> Self {
        Self {
            status: HealthState::Progressing,
            status_reason: None,
        }
    }

    /// An unknown verdict with a reason.
    #[must_use]
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            status: HealthState::Unknown,
            status_reason: Some(reason.into()),
        }
    }

    /// Whether the verdict is `Healthy`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}
