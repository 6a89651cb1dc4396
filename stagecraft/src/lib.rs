//! # Stagecraft
//!
//! Stage reconciliation core for a progressive-delivery control plane.
//!
//! A *Stage* describes one environment ("dev", "qa", "prod") subscribed to
//! artifact sources (git repositories, image registries, chart registries)
//! or to upstream Stages. Stagecraft continuously reconciles observed
//! Stages against newly discovered *Freight* (immutable, content-addressed
//! artifact bundles), maintaining each Stage's available-freight stack,
//! health, and history, and creating *Promotion* orders where policy
//! allows:
//!
//! - **Discovery**: pluggable fetchers produce the latest commits, image
//!   tags, and chart versions, assembled into fingerprinted Freight
//! - **Stage graph**: Stages subscribe to upstream Stages and inherit the
//!   qualified Freight they have proven out
//! - **Policy gating**: auto-promotion fires only for an unambiguous,
//!   enabled policy with a single freight source
//! - **Idempotent status**: per-pass snapshots, optimistic-concurrency
//!   write-back, cooperative cancellation at every suspension point
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stagecraft::prelude::*;
//!
//! let store: Arc<InMemoryControlPlane> = Arc::new(InMemoryControlPlane::new());
//! let reconciler = StageReconciler::new(
//!     store.clone(),
//!     Arc::new(MyDiscovery::new()),
//!     Arc::new(UpstreamCollector::new(store.clone())),
//!     Arc::new(MyHealthEvaluator::new()),
//! );
//!
//! let next = reconciler.reconcile(&CancellationToken::new(), &stage).await?;
//! StatusWriter::new(store).write(&CancellationToken::new(), &stage, &next).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod assembler;
pub mod cancellation;
pub mod errors;
pub mod events;
pub mod fingerprint;
pub mod gate;
pub mod ports;
pub mod reconciler;
pub mod store;
pub mod testing;
pub mod upstream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::{
        Chart, Freight, FreightStack, GitCommit, Health, HealthState, Image, Promotion,
        PromotionPolicy, PromotionState, Stage, StageKey, StageSpec, StageStatus,
    };
    pub use crate::assembler::FreightAssembler;
    pub use crate::cancellation::CancellationToken;
    pub use crate::errors::{DiscoveryError, ReconcileError, StoreError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, ReconcileEvent};
    pub use crate::gate::{GateDecision, PromotionGate, SuppressReason};
    pub use crate::ports::{ArtifactDiscovery, HealthEvaluator, UpstreamSource};
    pub use crate::reconciler::{StageReconciler, StatusWriter};
    pub use crate::store::{ControlPlane, InMemoryControlPlane};
    pub use crate::upstream::UpstreamCollector;
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
