//! Error taxonomy for the reconciliation core.
//!
//! Errors are layered: discoverers and the store surface their own types,
//! and the reconciler wraps them with context naming the failing kind.
//! Policy ambiguity is deliberately absent here; it suppresses
//! auto-promotion instead of erring (see the promotion gate).

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by artifact discoverers and upstream collection.
///
/// All variants are transient from the scheduler's point of view: the pass
/// aborts without a status write and is requeued with backoff.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discoverer ran out of time before producing a result.
    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),

    /// A transient I/O failure.
    #[error("{0}")]
    Transient(String),
}

/// Errors surfaced by the control-plane store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Resource-version mismatch on a conditional update.
    #[error("resource version conflict on {0}")]
    Conflict(String),

    /// An object with the same name already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The referenced object does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A transient I/O failure.
    #[error("{0}")]
    Transient(String),
}

impl StoreError {
    /// Whether this is an optimistic-concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether this is a unique-name collision on insert.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Errors surfaced by a reconcile pass.
///
/// Only errors actionable for the scheduler (retry or immediate requeue)
/// reach this type. When a pass errs, the Stage's status is left exactly as
/// it was observed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The loop-guard lookup against the store failed.
    #[error("error checking for non-terminal promotions: {0}")]
    PromotionLookup(#[source] StoreError),

    /// Discovery against git repo subscriptions failed.
    #[error("error syncing git repo subscriptions: {0}")]
    GitSync(#[source] DiscoveryError),

    /// Discovery against image repo subscriptions failed.
    #[error("error syncing image repo subscriptions: {0}")]
    ImageSync(#[source] DiscoveryError),

    /// Discovery against chart repo subscriptions failed.
    #[error("error syncing chart repo subscriptions: {0}")]
    ChartSync(#[source] DiscoveryError),

    /// Collection from upstream Stages failed.
    #[error("error collecting freight from upstream stages: {0}")]
    UpstreamSync(#[source] DiscoveryError),

    /// The promotion-policy lookup failed.
    #[error("error listing promotion policies: {0}")]
    PolicyLookup(#[source] StoreError),

    /// Creating a Promotion failed for a reason other than the name
    /// already existing.
    #[error("error creating promotion {name}: {source}")]
    PromotionCreate {
        /// Name of the Promotion that could not be created.
        name: String,
        /// The underlying store failure.
        #[source]
        source: StoreError,
    },

    /// Writing the Stage's status back failed.
    #[error("error updating stage status: {0}")]
    StatusWrite(#[source] StoreError),

    /// The pass was cancelled or outlived its deadline.
    #[error("reconcile pass cancelled: {0}")]
    Cancelled(String),
}

impl ReconcileError {
    /// Whether the scheduler should requeue immediately rather than with
    /// backoff.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StatusWrite(source) if source.is_conflict())
    }

    /// Whether the pass stopped because of cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_error_messages() {
        let err = ReconcileError::GitSync(DiscoveryError::Transient("something went wrong".into()));
        let message = err.to_string();
        assert!(message.contains("error syncing git repo subscriptions"));
        assert!(message.contains("something went wrong"));
    }

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::Conflict("stage".into()).is_conflict());
        assert!(!StoreError::Transient("io".into()).is_conflict());
        assert!(StoreError::AlreadyExists("promotion".into()).is_already_exists());
    }

    #[test]
    fn test_reconcile_error_conflict_passthrough() {
        let err = ReconcileError::StatusWrite(StoreError::Conflict("fake-stage".into()));
        assert!(err.is_conflict());

        let err = ReconcileError::StatusWrite(StoreError::Transient("io".into()));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_timeout_formatting() {
        let err = DiscoveryError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("timed out"));
    }
}
