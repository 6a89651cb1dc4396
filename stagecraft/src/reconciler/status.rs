//! Idempotent status write-back.

use std::sync::Arc;

use tracing::debug;

use crate::api::{Stage, StageStatus};
use crate::cancellation::CancellationToken;
use crate::errors::ReconcileError;
use crate::store::ControlPlane;

/// Writes reconciled status back through the store's conditional update.
///
/// Never touches the spec. A conflict means the observed snapshot went
/// stale mid-pass; the error is surfaced so the scheduler requeues against
/// a fresh read.
pub struct StatusWriter {
    store: Arc<dyn ControlPlane>,
}

impl StatusWriter {
    /// Creates a writer backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ControlPlane>) -> Self {
        Self { store }
    }

    /// Writes `next` for the observed Stage. A write that would change
    /// nothing is skipped.
    pub async fn write(
        &self,
        token: &CancellationToken,
        stage: &Stage,
        next: &StageStatus,
    ) -> Result<(), ReconcileError> {
        if *next == stage.status {
            debug!(stage = %stage.key(), "status unchanged, skipping write");
            return Ok(());
        }

        token.ensure_active()?;
        self.store
            .update_stage_status(token, &stage.key(), stage.resource_version, next.clone())
            .await
            .map_err(ReconcileError::StatusWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Freight;
    use crate::store::InMemoryControlPlane;

    fn seeded_store() -> (Arc<InMemoryControlPlane>, Stage) {
        let store = Arc::new(InMemoryControlPlane::new());
        let stage = Stage {
            namespace: "fake-namespace".to_string(),
            name: "fake-stage".to_string(),
            resource_version: 7,
            ..Stage::default()
        };
        store.put_stage(stage.clone());
        (store, stage)
    }

    fn writer(store: &Arc<InMemoryControlPlane>) -> StatusWriter {
        StatusWriter::new(Arc::clone(store) as Arc<dyn ControlPlane>)
    }

    #[tokio::test]
    async fn test_unchanged_status_skips_write() {
        let (store, stage) = seeded_store();
        let token = CancellationToken::new();

        writer(&store)
            .write(&token, &stage, &stage.status.clone())
            .await
            .unwrap();

        let stored = store.get_stage(&token, &stage.key()).await.unwrap().unwrap();
        // No write happened, so the version was not bumped.
        assert_eq!(stored.resource_version, 7);
    }

    #[tokio::test]
    async fn test_changed_status_is_written() {
        let (store, stage) = seeded_store();
        let token = CancellationToken::new();

        let mut next = stage.status.clone();
        next.current_freight = Some(Freight {
            id: "abc".to_string(),
            ..Freight::default()
        });
        writer(&store).write(&token, &stage, &next).await.unwrap();

        let stored = store.get_stage(&token, &stage.key()).await.unwrap().unwrap();
        assert_eq!(stored.status, next);
        assert_eq!(stored.resource_version, 8);
    }

    #[tokio::test]
    async fn test_stale_snapshot_conflicts() {
        let (store, mut stage) = seeded_store();
        let token = CancellationToken::new();

        // Another writer advanced the resource meanwhile.
        stage.resource_version = 6;
        let mut next = stage.status.clone();
        next.current_freight = Some(Freight::default());

        let err = writer(&store)
            .write(&token, &stage, &next)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_cancelled_pass_never_writes() {
        let (store, stage) = seeded_store();
        let token = CancellationToken::new();
        token.cancel("scheduler shutdown");

        let mut next = stage.status.clone();
        next.current_freight = Some(Freight::default());

        let err = writer(&store)
            .write(&token, &stage, &next)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());

        let stored = store.get_stage(&token, &stage.key()).await.unwrap().unwrap();
        assert_eq!(stored.resource_version, 7);
    }
}
