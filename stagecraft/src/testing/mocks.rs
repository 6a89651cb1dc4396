//! Mock capabilities for reconciler tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{
    Chart, ChartSubscription, DeploymentTarget, Freight, GitCommit, GitSubscription, Health,
    Image, ImageSubscription, Promotion, PromotionPolicy, Stage, StageKey, StageStatus,
    StageSubscription,
};
use crate::cancellation::CancellationToken;
use crate::errors::{DiscoveryError, StoreError};
use crate::ports::{ArtifactDiscovery, HealthEvaluator, UpstreamSource};
use crate::store::{ControlPlane, InMemoryControlPlane};

/// Scripted artifact discovery with call recording.
#[derive(Debug, Default)]
pub struct MockDiscovery {
    commits: Vec<GitCommit>,
    images: Vec<Image>,
    charts: Vec<Chart>,
    commit_error: Option<String>,
    image_error: Option<String>,
    chart_error: Option<String>,
    latency: Option<Duration>,
    call_count: Mutex<usize>,
}

impl MockDiscovery {
    /// Creates a discovery mock returning empty results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the commits to return.
    #[must_use]
    pub fn with_commits(mut self, commits: Vec<GitCommit>) -> Self {
        self.commits = commits;
        self
    }

    /// Sets the images to return.
    #[must_use]
    pub fn with_images(mut self, images: Vec<Image>) -> Self {
        self.images = images;
        self
    }

    /// Sets the charts to return.
    #[must_use]
    pub fn with_charts(mut self, charts: Vec<Chart>) -> Self {
        self.charts = charts;
        self
    }

    /// Makes commit discovery fail with a transient error.
    #[must_use]
    pub fn failing_commits(mut self, message: impl Into<String>) -> Self {
        self.commit_error = Some(message.into());
        self
    }

    /// Makes image discovery fail with a transient error.
    #[must_use]
    pub fn failing_images(mut self, message: impl Into<String>) -> Self {
        self.image_error = Some(message.into());
        self
    }

    /// Makes chart discovery fail with a transient error.
    #[must_use]
    pub fn failing_charts(mut self, message: impl Into<String>) -> Self {
        self.chart_error = Some(message.into());
        self
    }

    /// Adds latency to every call, for deadline tests.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of discovery calls made across all three kinds.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    async fn observe(&self) {
        *self.call_count.lock() += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ArtifactDiscovery for MockDiscovery {
    async fn latest_commits(
        &self,
        _token: &CancellationToken,
        _namespace: &str,
        _subs: &[GitSubscription],
    ) -> Result<Vec<GitCommit>, DiscoveryError> {
        self.observe().await;
        if let Some(message) = &self.commit_error {
            return Err(DiscoveryError::Transient(message.clone()));
        }
        Ok(self.commits.clone())
    }

    async fn latest_images(
        &self,
        _token: &CancellationToken,
        _namespace: &str,
        _subs: &[ImageSubscription],
    ) -> Result<Vec<Image>, DiscoveryError> {
        self.observe().await;
        if let Some(message) = &self.image_error {
            return Err(DiscoveryError::Transient(message.clone()));
        }
        Ok(self.images.clone())
    }

    async fn latest_charts(
        &self,
        _token: &CancellationToken,
        _namespace: &str,
        _subs: &[ChartSubscription],
    ) -> Result<Vec<Chart>, DiscoveryError> {
        self.observe().await;
        if let Some(message) = &self.chart_error {
            return Err(DiscoveryError::Transient(message.clone()));
        }
        Ok(self.charts.clone())
    }
}

/// Scripted upstream source with call recording.
#[derive(Debug, Default)]
pub struct MockUpstreamSource {
    freight: Vec<Freight>,
    error: Option<String>,
    call_count: Mutex<usize>,
}

impl MockUpstreamSource {
    /// Creates a source returning no candidates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidates to return.
    #[must_use]
    pub fn with_freight(mut self, freight: Vec<Freight>) -> Self {
        self.freight = freight;
        self
    }

    /// Makes collection fail with a transient error.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Number of collection calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl UpstreamSource for MockUpstreamSource {
    async fn available_freight(
        &self,
        _token: &CancellationToken,
        _namespace: &str,
        _subs: &[StageSubscription],
    ) -> Result<Vec<Freight>, DiscoveryError> {
        *self.call_count.lock() += 1;
        if let Some(message) = &self.error {
            return Err(DiscoveryError::Transient(message.clone()));
        }
        Ok(self.freight.clone())
    }
}

/// Health evaluator returning a fixed verdict, recording what it checked.
#[derive(Debug)]
pub struct MockHealthEvaluator {
    verdict: Health,
    checked: Mutex<Vec<String>>,
}

impl MockHealthEvaluator {
    /// Creates an evaluator returning the given verdict.
    #[must_use]
    pub fn new(verdict: Health) -> Self {
        Self {
            verdict,
            checked: Mutex::new(Vec::new()),
        }
    }

    /// Creates an evaluator that always reports healthy.
    #[must_use]
    pub fn healthy() -> Self {
        Self::new(Health::healthy())
    }

    /// Freight IDs checked so far.
    #[must_use]
    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().clone()
    }
}

#[async_trait]
impl HealthEvaluator for MockHealthEvaluator {
    async fn check(
        &self,
        _token: &CancellationToken,
        freight: &Freight,
        _targets: &[DeploymentTarget],
    ) -> Health {
        self.checked.lock().push(freight.id.clone());
        self.verdict.clone()
    }
}

/// Control-plane wrapper injecting failures per operation.
///
/// Delegates to an [`InMemoryControlPlane`] unless a failure is scripted for
/// the operation.
pub struct FaultyControlPlane {
    inner: Arc<InMemoryControlPlane>,
    promotion_lookup_error: Option<String>,
    policy_lookup_error: Option<String>,
    create_conflicts: bool,
    create_error: Option<String>,
}

impl FaultyControlPlane {
    /// Wraps the given store with no failures scripted.
    #[must_use]
    pub fn new(inner: Arc<InMemoryControlPlane>) -> Self {
        Self {
            inner,
            promotion_lookup_error: None,
            policy_lookup_error: None,
            create_conflicts: false,
            create_error: None,
        }
    }

    /// Makes the loop-guard lookup fail.
    #[must_use]
    pub fn failing_promotion_lookup(mut self, message: impl Into<String>) -> Self {
        self.promotion_lookup_error = Some(message.into());
        self
    }

    /// Makes policy listing fail.
    #[must_use]
    pub fn failing_policy_lookup(mut self, message: impl Into<String>) -> Self {
        self.policy_lookup_error = Some(message.into());
        self
    }

    /// Makes promotion creation collide as if the name already existed.
    #[must_use]
    pub fn conflicting_create(mut self) -> Self {
        self.create_conflicts = true;
        self
    }

    /// Makes promotion creation fail with a transient error.
    #[must_use]
    pub fn failing_create(mut self, message: impl Into<String>) -> Self {
        self.create_error = Some(message.into());
        self
    }
}

#[async_trait]
impl ControlPlane for FaultyControlPlane {
    async fn get_stage(
        &self,
        token: &CancellationToken,
        key: &StageKey,
    ) -> Result<Option<Stage>, StoreError> {
        self.inner.get_stage(token, key).await
    }

    async fn list_promotion_policies(
        &self,
        token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<Vec<PromotionPolicy>, StoreError> {
        if let Some(message) = &self.policy_lookup_error {
            return Err(StoreError::Transient(message.clone()));
        }
        self.inner
            .list_promotion_policies(token, namespace, stage)
            .await
    }

    async fn has_non_terminal_promotions(
        &self,
        token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<bool, StoreError> {
        if let Some(message) = &self.promotion_lookup_error {
            return Err(StoreError::Transient(message.clone()));
        }
        self.inner
            .has_non_terminal_promotions(token, namespace, stage)
            .await
    }

    async fn create_promotion(
        &self,
        token: &CancellationToken,
        promotion: Promotion,
    ) -> Result<(), StoreError> {
        if self.create_conflicts {
            return Err(StoreError::AlreadyExists(format!(
                "promotion {}",
                promotion.name
            )));
        }
        if let Some(message) = &self.create_error {
            return Err(StoreError::Transient(message.clone()));
        }
        self.inner.create_promotion(token, promotion).await
    }

    async fn update_stage_status(
        &self,
        token: &CancellationToken,
        key: &StageKey,
        observed_version: u64,
        status: StageStatus,
    ) -> Result<(), StoreError> {
        self.inner
            .update_stage_status(token, key, observed_version, status)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_discovery_records_calls() {
        let discovery = MockDiscovery::new().with_commits(vec![GitCommit::new("u", "c")]);
        let token = CancellationToken::new();

        let commits = discovery.latest_commits(&token, "ns", &[]).await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(discovery.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_discovery_failure() {
        let discovery = MockDiscovery::new().failing_images("boom");
        let token = CancellationToken::new();

        let err = discovery.latest_images(&token, "ns", &[]).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_mock_health_records_checked_freight() {
        let evaluator = MockHealthEvaluator::healthy();
        let token = CancellationToken::new();
        let freight = Freight {
            id: "abc".to_string(),
            ..Freight::default()
        };

        let verdict = evaluator.check(&token, &freight, &[]).await;
        assert!(verdict.is_healthy());
        assert_eq!(evaluator.checked(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_faulty_control_plane_scripts_lookup_failure() {
        let store = FaultyControlPlane::new(Arc::new(InMemoryControlPlane::new()))
            .failing_promotion_lookup("something went wrong");
        let token = CancellationToken::new();

        let err = store
            .has_non_terminal_promotions(&token, "ns", "stage")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("something went wrong"));
    }

    #[tokio::test]
    async fn test_faulty_control_plane_delegates_when_unscripted() {
        let inner = Arc::new(InMemoryControlPlane::new());
        let store = FaultyControlPlane::new(Arc::clone(&inner));
        let token = CancellationToken::new();

        let blocked = store
            .has_non_terminal_promotions(&token, "ns", "stage")
            .await
            .unwrap();
        assert!(!blocked);
    }
}
