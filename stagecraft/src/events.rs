//! Reconcile event stream.
//!
//! Events are the extension point for observers: suppressed auto-promotions
//! and qualification decisions are visible here without ever surfacing as
//! reconcile errors. Sinks must never fail the pass.

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::api::StageKey;
use crate::gate::SuppressReason;

/// Events a reconcile pass may emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// New Freight was pushed onto a Stage's available stack.
    FreightDiscovered {
        /// The Stage being reconciled.
        stage: StageKey,
        /// ID of the discovered Freight.
        freight_id: String,
    },
    /// A control-flow Stage qualified Freight for downstream consumption.
    FreightQualified {
        /// The Stage being reconciled.
        stage: StageKey,
        /// ID of the qualified Freight.
        freight_id: String,
    },
    /// A Promotion order was created.
    PromotionCreated {
        /// The Stage being advanced.
        stage: StageKey,
        /// Name of the Promotion object.
        promotion: String,
        /// ID of the Freight being advanced to.
        freight_id: String,
    },
    /// The gate declined to auto-promote.
    AutoPromotionSuppressed {
        /// The Stage being reconciled.
        stage: StageKey,
        /// Why promotion did not fire.
        reason: SuppressReason,
    },
}

/// Receiver for reconcile events.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Implementations swallow their own errors.
    fn emit(&self, event: ReconcileEvent);
}

/// Discards all events. The default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: ReconcileEvent) {
        // Intentionally empty.
    }
}

/// Logs events through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event: ReconcileEvent) {
        match event {
            ReconcileEvent::FreightDiscovered { stage, freight_id } => {
                info!(stage = %stage, freight = %freight_id, "freight discovered");
            }
            ReconcileEvent::FreightQualified { stage, freight_id } => {
                info!(stage = %stage, freight = %freight_id, "freight qualified");
            }
            ReconcileEvent::PromotionCreated {
                stage,
                promotion,
                freight_id,
            } => {
                info!(
                    stage = %stage,
                    promotion = %promotion,
                    freight = %freight_id,
                    "promotion created"
                );
            }
            ReconcileEvent::AutoPromotionSuppressed { stage, reason } => {
                debug!(stage = %stage, reason = %reason, "auto-promotion suppressed");
            }
        }
    }
}

/// Records events for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ReconcileEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().clone()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: ReconcileEvent) {
        self.events.lock().push(event);
    }
}
