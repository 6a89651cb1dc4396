//! Assembly of repo-sourced Freight from discovery outputs.

use std::sync::Arc;

use tracing::debug;

use crate::api::{Freight, RepoSubscriptions};
use crate::cancellation::CancellationToken;
use crate::errors::ReconcileError;
use crate::ports::ArtifactDiscovery;

/// Combines the three discoverers' outputs into one canonical Freight.
///
/// Artifact lists are sorted before fingerprinting so equal discovery
/// results always produce the same Freight ID.
pub struct FreightAssembler {
    discovery: Arc<dyn ArtifactDiscovery>,
}

impl FreightAssembler {
    /// Creates an assembler over the given discovery implementation.
    #[must_use]
    pub fn new(discovery: Arc<dyn ArtifactDiscovery>) -> Self {
        Self { discovery }
    }

    /// Returns the latest Freight for the subscriptions, or `None` when no
    /// artifact source has produced anything yet.
    ///
    /// All three discovery steps run even when a subscription list is
    /// empty; a failure in any one aborts with an error naming the kind.
    pub async fn assemble(
        &self,
        token: &CancellationToken,
        namespace: &str,
        subs: &RepoSubscriptions,
    ) -> Result<Option<Freight>, ReconcileError> {
        token.ensure_active()?;
        let mut commits = self
            .discovery
            .latest_commits(token, namespace, &subs.git)
            .await
            .map_err(ReconcileError::GitSync)?;

        token.ensure_active()?;
        let mut images = self
            .discovery
            .latest_images(token, namespace, &subs.images)
            .await
            .map_err(ReconcileError::ImageSync)?;

        token.ensure_active()?;
        let mut charts = self
            .discovery
            .latest_charts(token, namespace, &subs.charts)
            .await
            .map_err(ReconcileError::ChartSync)?;

        if commits.is_empty() && images.is_empty() && charts.is_empty() {
            return Ok(None);
        }

        commits.sort_by(|a, b| a.repo_url.cmp(&b.repo_url));
        images.sort_by(|a, b| {
            (a.repo_url.as_str(), a.tag.as_str()).cmp(&(b.repo_url.as_str(), b.tag.as_str()))
        });
        charts.sort_by(|a, b| {
            (a.registry_url.as_str(), a.name.as_str())
                .cmp(&(b.registry_url.as_str(), b.name.as_str()))
        });

        let mut freight = Freight::from_artifacts(commits, images, charts);
        // Sourced directly from repositories; nothing upstream to wait for.
        freight.qualified = true;

        debug!(
            namespace = %namespace,
            freight = %freight.id,
            "assembled freight from repo subscriptions"
        );
        Ok(Some(freight))
    }
}
