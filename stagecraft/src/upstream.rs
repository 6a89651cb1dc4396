//! Collection of candidate Freight from upstream Stages.

use std::sync::Arc;

use async_trait::async_trait;

use tracing::debug;

use crate::api::{Freight, StageKey, StageSubscription};
use crate::cancellation::CancellationToken;
use crate::errors::DiscoveryError;
use crate::ports::UpstreamSource;
use crate::store::ControlPlane;

/// Store-backed upstream collector.
///
/// Each upstream Stage is read fresh from the store every pass; there is no
/// cross-pass cache, so stale upstream status simply converges on a later
/// trigger.
pub struct UpstreamCollector {
    store: Arc<dyn ControlPlane>,
}

impl UpstreamCollector {
    /// Creates a collector backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ControlPlane>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UpstreamSource for UpstreamCollector {
    async fn available_freight(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &[StageSubscription],
    ) -> Result<Vec<Freight>, DiscoveryError> {
        let mut candidates: Vec<Freight> = Vec::new();
        for sub in subs {
            let key = StageKey::new(namespace, &sub.name);
            let upstream = self
                .store
                .get_stage(token, &key)
                .await
                .map_err(|err| {
                    DiscoveryError::Transient(format!("error reading upstream stage {key}: {err}"))
                })?;
            let Some(upstream) = upstream else {
                // Not created yet, or deleted; converge on a later pass.
                debug!(stage = %key, "upstream stage not found");
                continue;
            };
            for freight in upstream.status.history.iter().filter(|f| f.qualified) {
                if !candidates.iter().any(|c| c.id == freight.id) {
                    candidates.push(freight.clone());
                }
            }
        }
        Ok(candidates)
    }
}
