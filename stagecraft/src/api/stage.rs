//! Stage resources: the declarative unit of reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::freight::{Freight, FreightStack};
use super::health::Health;
use super::promotion::PromotionInfo;

/// Key identifying a Stage: (namespace, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageKey {
    /// Namespace the Stage lives in.
    pub namespace: String,
    /// Name of the Stage.
    pub name: String,
}

impl StageKey {
    /// Creates a key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A Stage resource as observed from the API store.
///
/// The store owns everything on a Stage except `status`, which is owned by
/// the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Namespace the Stage lives in.
    pub namespace: String,
    /// Name of the Stage.
    pub name: String,
    /// Optimistic-concurrency guard maintained by the API store.
    #[serde(default)]
    pub resource_version: u64,
    /// Declarative spec.
    pub spec: StageSpec,
    /// Observed state.
    #[serde(default)]
    pub status: StageStatus,
}

impl Stage {
    /// The Stage's (namespace, name) key.
    #[must_use]
    pub fn key(&self) -> StageKey {
        StageKey::new(&self.namespace, &self.name)
    }

    /// Whether this Stage only routes qualification downstream.
    ///
    /// A Stage without promotion mechanisms deploys nothing itself; Freight
    /// passing through it is qualified immediately.
    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        self.spec.promotion_mechanisms.is_none()
    }
}

/// Declarative Stage spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    /// Artifact or upstream-Stage subscriptions.
    #[serde(default)]
    pub subscriptions: Subscriptions,
    /// How the external executor advances this Stage. Absent for
    /// control-flow Stages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_mechanisms: Option<PromotionMechanisms>,
    /// Deployment targets the health evaluator inspects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_checks: Option<Vec<DeploymentTarget>>,
}

/// Subscriptions driving Freight discovery for a Stage.
///
/// Exactly one of the two families is expected to be populated; admission
/// enforces this upstream of the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriptions {
    /// Direct artifact-repository subscriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<RepoSubscriptions>,
    /// Upstream Stages whose qualified Freight feeds this Stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_stages: Vec<StageSubscription>,
}

/// Per-kind artifact repository subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSubscriptions {
    /// Git repository subscriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub git: Vec<GitSubscription>,
    /// Container image repository subscriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageSubscription>,
    /// Helm chart registry subscriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartSubscription>,
}

/// Subscription to a git repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSubscription {
    /// URL of the repository.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Branch to track; the discoverer's default branch when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Subscription to a container image repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSubscription {
    /// URL of the image repository.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Constraint narrowing which tags are eligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver_constraint: Option<String>,
}

/// Subscription to a Helm chart registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSubscription {
    /// URL of the chart registry.
    #[serde(rename = "registryURL")]
    pub registry_url: String,
    /// Chart name within the registry.
    pub name: String,
    /// Constraint narrowing which versions are eligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver_constraint: Option<String>,
}

/// Reference to an upstream Stage in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSubscription {
    /// Name of the upstream Stage.
    pub name: String,
}

impl StageSubscription {
    /// Creates a reference to the named upstream Stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Mechanisms the external promotion executor uses to advance a Stage.
///
/// The reconciler only inspects presence; the contents are the executor's
/// contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionMechanisms {
    /// GitOps repository writes performed on promotion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub git_repo_updates: Vec<GitRepoUpdate>,
    /// Delivery-tool applications refreshed on promotion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub app_updates: Vec<DeploymentTarget>,
}

/// A GitOps repository write the executor performs on promotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepoUpdate {
    /// URL of the repository to write.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Branch to write; the repository default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// A delivery-tool application consulted by the health evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTarget {
    /// Application name.
    pub app_name: String,
    /// Namespace the application lives in; the delivery tool's default
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_namespace: Option<String>,
}

impl DeploymentTarget {
    /// Creates a target for the named application.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_namespace: None,
        }
    }
}

/// Observed Stage state. The only part of a Stage the reconciler writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    /// The Freight currently applied, or `None` for control-flow Stages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_freight: Option<Freight>,
    /// Freight eligible for promotion, newest at the top; set semantics
    /// by ID.
    #[serde(default, skip_serializing_if = "FreightStack::is_empty")]
    pub available_freight: FreightStack,
    /// Freight that has occupied `current_freight`, newest at the top.
    #[serde(default, skip_serializing_if = "FreightStack::is_empty")]
    pub history: FreightStack,
    /// Last health verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
    /// Pointer to an in-flight Promotion, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_promotion: Option<PromotionInfo>,
}
