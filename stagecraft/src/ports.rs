//! Injected capabilities the reconciler is composed over.
//!
//! One trait per capability group, following the Interface Segregation
//! Principle: the reconciler receives exactly the behaviors it needs, and
//! test doubles implement them directly. Implementations own their network
//! I/O and credential resolution.

use async_trait::async_trait;

use crate::api::{
    Chart, ChartSubscription, DeploymentTarget, Freight, GitCommit, GitSubscription, Health,
    Image, ImageSubscription, StageSubscription,
};
use crate::cancellation::CancellationToken;
use crate::errors::DiscoveryError;

/// Artifact discovery across the three repository kinds.
///
/// Each method returns the latest artifact per subscription, in any order;
/// the assembler canonicalizes. A timed-out fetch surfaces as
/// [`DiscoveryError::Timeout`] and is treated as transient.
#[async_trait]
pub trait ArtifactDiscovery: Send + Sync {
    /// Latest commit for each git subscription.
    async fn latest_commits(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &[GitSubscription],
    ) -> Result<Vec<GitCommit>, DiscoveryError>;

    /// Latest eligible tag for each image subscription.
    async fn latest_images(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &[ImageSubscription],
    ) -> Result<Vec<Image>, DiscoveryError>;

    /// Latest eligible version for each chart subscription.
    async fn latest_charts(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &[ChartSubscription],
    ) -> Result<Vec<Chart>, DiscoveryError>;
}

/// Source of candidate Freight from upstream Stages.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Qualified Freight drawn from the given upstream Stages' histories.
    async fn available_freight(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &[StageSubscription],
    ) -> Result<Vec<Freight>, DiscoveryError>;
}

/// Health verdict provider for a Stage's current Freight.
#[async_trait]
pub trait HealthEvaluator: Send + Sync {
    /// Checks the deployment targets backing `freight`.
    ///
    /// Implementations degrade their own failures to an `Unknown` verdict
    /// rather than erring; a verdict is always produced.
    async fn check(
        &self,
        token: &CancellationToken,
        freight: &Freight,
        targets: &[DeploymentTarget],
    ) -> Health;
}
