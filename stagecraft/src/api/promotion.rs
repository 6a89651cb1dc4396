//! Promotion orders and the policies gating their automatic creation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::freight::Freight;

/// An order to transition a Stage to a specific Freight.
///
/// Execution is owned by the external promotion subsystem; the reconciler
/// only creates these and observes their non-terminal presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Namespace the Promotion lives in.
    pub namespace: String,
    /// Unique name within the namespace.
    pub name: String,
    /// The Stage being advanced.
    pub stage: String,
    /// ID of the Freight to advance to.
    pub freight_id: String,
    /// Lifecycle state, maintained by the executor.
    #[serde(default)]
    pub state: PromotionState,
}

/// Lifecycle states of a Promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionState {
    /// Created but not yet picked up by the executor.
    Pending,
    /// Being executed.
    Running,
    /// Executed successfully.
    Succeeded,
    /// Execution failed.
    Failed,
    /// Execution could not be attempted.
    Errored,
}

impl Default for PromotionState {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for PromotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Errored => write!(f, "Errored"),
        }
    }
}

impl PromotionState {
    /// Whether the Promotion has finished, successfully or not.
    ///
    /// A Stage with a non-terminal Promotion is owned by the executor and
    /// the reconciler leaves its status alone.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }
}

/// Pointer to the in-flight Promotion recorded on Stage status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionInfo {
    /// Name of the Promotion.
    pub name: String,
    /// The Freight it is advancing to.
    pub freight: Freight,
}

/// Per-Stage configuration controlling auto-promotion eligibility.
///
/// Exactly one policy must select a Stage for auto-promotion to be
/// considered; several selecting the same Stage is ambiguous and suppresses
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPolicy {
    /// Namespace the policy lives in.
    pub namespace: String,
    /// Name of the policy.
    pub name: String,
    /// The Stage this policy selects.
    pub stage: String,
    /// Whether newly available Freight is promoted without human action.
    #[serde(default)]
    pub enable_auto_promotion: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_state_terminal() {
        assert!(PromotionState::Succeeded.is_terminal());
        assert!(PromotionState::Failed.is_terminal());
        assert!(PromotionState::Errored.is_terminal());
        assert!(!PromotionState::Pending.is_terminal());
        assert!(!PromotionState::Running.is_terminal());
    }

    #[test]
    fn test_promotion_state_default_is_pending() {
        assert_eq!(PromotionState::default(), PromotionState::Pending);
    }

    #[test]
    fn test_promotion_state_display() {
        assert_eq!(PromotionState::Pending.to_string(), "Pending");
        assert_eq!(PromotionState::Succeeded.to_string(), "Succeeded");
    }

    #[test]
    fn test_promotion_wire_names() {
        let promotion = Promotion {
            namespace: "ns".to_string(),
            name: "dev.abc1234.xyz12".to_string(),
            stage: "dev".to_string(),
            freight_id: "abc1234".to_string(),
            state: PromotionState::Pending,
        };

        let json = serde_json::to_string(&promotion).unwrap();
        assert!(json.contains(r#""freightId""#));
        assert!(json.contains(r#""state":"Pending""#));
    }
}
