//! Control-plane store interface and an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{Promotion, PromotionPolicy, Stage, StageKey, StageStatus};
use crate::cancellation::CancellationToken;
use crate::errors::StoreError;

/// Read/write surface of the API store the core depends on.
///
/// The store owns Stage, PromotionPolicy, and Promotion objects. The
/// reconciler reads all three, writes nothing but Stage status, and inserts
/// new Promotions.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetches a Stage by key. `Ok(None)` when it does not exist.
    async fn get_stage(
        &self,
        token: &CancellationToken,
        key: &StageKey,
    ) -> Result<Option<Stage>, StoreError>;

    /// Lists promotion policies selecting the named Stage.
    async fn list_promotion_policies(
        &self,
        token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<Vec<PromotionPolicy>, StoreError>;

    /// Returns whether any non-terminal Promotion exists for the Stage.
    async fn has_non_terminal_promotions(
        &self,
        token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<bool, StoreError>;

    /// Inserts a Promotion, unique by (namespace, name).
    ///
    /// A name collision returns [`StoreError::AlreadyExists`]; callers
    /// creating idempotently treat that as pre-existing intent.
    async fn create_promotion(
        &self,
        token: &CancellationToken,
        promotion: Promotion,
    ) -> Result<(), StoreError>;

    /// Conditionally replaces a Stage's status.
    ///
    /// `observed_version` must match the stored resource version or the
    /// update is rejected with [`StoreError::Conflict`]. The spec is never
    /// touched.
    async fn update_stage_status(
        &self,
        token: &CancellationToken,
        key: &StageKey,
        observed_version: u64,
        status: StageStatus,
    ) -> Result<(), StoreError>;
}

/// In-memory control plane for tests and embedding.
///
/// Behaves like the real store for the operations the core performs:
/// resource-version-guarded status updates and unique-name promotion
/// inserts.
#[derive(Debug, Default)]
pub struct InMemoryControlPlane {
    stages: Mutex<HashMap<StageKey, Stage>>,
    policies: Mutex<Vec<PromotionPolicy>>,
    promotions: Mutex<HashMap<(String, String), Promotion>>,
}

impl InMemoryControlPlane {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a Stage.
    pub fn put_stage(&self, stage: Stage) {
        self.stages.lock().insert(stage.key(), stage);
    }

    /// Inserts a promotion policy.
    pub fn put_policy(&self, policy: PromotionPolicy) {
        self.policies.lock().push(policy);
    }

    /// Inserts or replaces a Promotion, bypassing the unique-name check.
    pub fn put_promotion(&self, promotion: Promotion) {
        self.promotions
            .lock()
            .insert((promotion.namespace.clone(), promotion.name.clone()), promotion);
    }

    /// All Promotions targeting the given Stage.
    #[must_use]
    pub fn promotions_for(&self, namespace: &str, stage: &str) -> Vec<Promotion> {
        self.promotions
            .lock()
            .values()
            .filter(|p| p.namespace == namespace && p.stage == stage)
            .cloned()
            .collect()
    }

    /// Total number of stored Promotions.
    #[must_use]
    pub fn promotion_count(&self) -> usize {
        self.promotions.lock().len()
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn get_stage(
        &self,
        _token: &CancellationToken,
        key: &StageKey,
    ) -> Result<Option<Stage>, StoreError> {
        Ok(self.stages.lock().get(key).cloned())
    }

    async fn list_promotion_policies(
        &self,
        _token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<Vec<PromotionPolicy>, StoreError> {
        Ok(self
            .policies
            .lock()
            .iter()
            .filter(|p| p.namespace == namespace && p.stage == stage)
            .cloned()
            .collect())
    }

    async fn has_non_terminal_promotions(
        &self,
        _token: &CancellationToken,
        namespace: &str,
        stage: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .promotions
            .lock()
            .values()
            .any(|p| p.namespace == namespace && p.stage == stage && !p.state.is_terminal()))
    }

    async fn create_promotion(
        &self,
        _token: &CancellationToken,
        promotion: Promotion,
    ) -> Result<(), StoreError> {
        let mut promotions = self.promotions.lock();
        let key = (promotion.namespace.clone(), promotion.name.clone());
        if promotions.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!(
                "promotion {}",
                promotion.name
            )));
        }
        promotions.insert(key, promotion);
        Ok(())
    }

    async fn update_stage_status(
        &self,
        _token: &CancellationToken,
        key: &StageKey,
        observed_version: u64,
        status: StageStatus,
    ) -> Result<(), StoreError> {
        let mut stages = self.stages.lock();
        let Some(stage) = stages.get_mut(key) else {
            return Err(StoreError::NotFound(format!("stage {key}")));
        };
        if stage.resource_version != observed_version {
            return Err(StoreError::Conflict(format!("stage {key}")));
        }
        stage.status = status;
        stage.resource_version += 1;
        Ok(())
    }
}
