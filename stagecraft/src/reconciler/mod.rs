//! The Stage reconciler: one pass over one observed Stage.

mod status;


pub use status::StatusWriter;

use std::sync::Arc;

use tracing::{debug, debug_span, info, warn, Instrument};
use uuid::Uuid;

use crate::api::{Freight, Promotion, PromotionState, Stage, StageKey, StageStatus};
use crate::assembler::FreightAssembler;
use crate::cancellation::CancellationToken;
use crate::errors::ReconcileError;
use crate::events::{EventSink, NoOpEventSink, ReconcileEvent};
use crate::gate::{promotion_name, GateDecision, PromotionGate, SuppressReason};
use crate::ports::{ArtifactDiscovery, HealthEvaluator, UpstreamSource};
use crate::store::ControlPlane;

/// Reconciles Stage resources against discovered Freight.
///
/// Composed over injected capabilities and pure with respect to the input
/// Stage snapshot: [`StageReconciler::reconcile`] returns the next status
/// without mutating its inputs. The only side effects are Promotion
/// creation through the store and events through the sink.
pub struct StageReconciler {
    store: Arc<dyn ControlPlane>,
    assembler: FreightAssembler,
    upstream: Arc<dyn UpstreamSource>,
    health: Arc<dyn HealthEvaluator>,
    gate: PromotionGate,
    events: Arc<dyn EventSink>,
}

impl StageReconciler {
    /// Creates a reconciler with the given capabilities and a no-op event
    /// sink.
    #[must_use]
    pub fn new(
        store: Arc<dyn ControlPlane>,
        discovery: Arc<dyn ArtifactDiscovery>,
        upstream: Arc<dyn UpstreamSource>,
        health: Arc<dyn HealthEvaluator>,
    ) -> Self {
        Self {
            assembler: FreightAssembler::new(discovery),
            gate: PromotionGate::new(Arc::clone(&store)),
            store,
            upstream,
            health,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs one reconcile pass, returning the next status.
    ///
    /// On any actionable error the input status is implicitly unchanged:
    /// nothing has been written, and the scheduler requeues against a fresh
    /// snapshot.
    pub async fn reconcile(
        &self,
        token: &CancellationToken,
        stage: &Stage,
    ) -> Result<StageStatus, ReconcileError> {
        let span = debug_span!(
            "reconcile",
            stage = %stage.key(),
            pass = %Uuid::now_v7(),
        );
        self.reconcile_inner(token, stage).instrument(span).await
    }

    async fn reconcile_inner(
        &self,
        token: &CancellationToken,
        stage: &Stage,
    ) -> Result<StageStatus, ReconcileError> {
        let key = stage.key();
        let mut status = stage.status.clone();

        // Loop guard: an in-flight Promotion owns the Stage until it lands.
        token.ensure_active()?;
        let blocked = self
            .store
            .has_non_terminal_promotions(token, &stage.namespace, &stage.name)
            .await
            .map_err(ReconcileError::PromotionLookup)?;
        if blocked {
            debug!(stage = %key, "in-flight promotion, skipping pass");
            return Ok(status);
        }
        // Whatever promotion the pointer referred to has reached a terminal
        // state.
        status.current_promotion = None;

        let subscriptions = &stage.spec.subscriptions;
        let discovered_new = if let Some(repos) = &subscriptions.repos {
            let Some(freight) = self.assembler.assemble(token, &stage.namespace, repos).await?
            else {
                // No artifact source has produced anything yet.
                return Ok(status);
            };
            self.merge_available(&key, &mut status, vec![freight])
        } else if !subscriptions.upstream_stages.is_empty() {
            token.ensure_active()?;
            let candidates = self
                .upstream
                .available_freight(token, &stage.namespace, &subscriptions.upstream_stages)
                .await
                .map_err(ReconcileError::UpstreamSync)?;
            self.merge_available(&key, &mut status, candidates)
        } else {
            return Ok(status);
        };

        if stage.is_control_flow() {
            self.qualify_passthrough(&key, &mut status);
            return Ok(status);
        }

        if let Some(current) = status.current_freight.clone() {
            token.ensure_active()?;
            let targets = stage.spec.health_checks.as_deref().unwrap_or_default();
            status.health = Some(self.health.check(token, &current, targets).await);
        }

        token.ensure_active()?;
        match self
            .gate
            .evaluate(token, stage, &status, discovered_new)
            .await?
        {
            GateDecision::Promote { freight_id } => {
                self.create_promotion(token, stage, &freight_id).await?;
            }
            GateDecision::Suppress(reason) => {
                debug!(stage = %key, reason = %reason, "auto-promotion suppressed");
                if reason != SuppressReason::NoNewFreight {
                    self.events.emit(ReconcileEvent::AutoPromotionSuppressed {
                        stage: key,
                        reason,
                    });
                }
            }
        }

        Ok(status)
    }

    /// Pushes candidates absent from the available stack, oldest first so
    /// the stack's top-down order matches the candidates' order. Returns
    /// whether a new top-of-stack entry appeared.
    fn merge_available(
        &self,
        key: &StageKey,
        status: &mut StageStatus,
        candidates: Vec<Freight>,
    ) -> bool {
        let mut pushed = false;
        for freight in candidates.into_iter().rev() {
            let freight_id = freight.id.clone();
            if status.available_freight.try_push(freight) {
                pushed = true;
                self.events.emit(ReconcileEvent::FreightDiscovered {
                    stage: key.clone(),
                    freight_id,
                });
            }
        }
        pushed
    }

    /// Control-flow shortcut: the Stage deploys nothing itself, so every
    /// available Freight is qualified and recorded as having passed
    /// through.
    fn qualify_passthrough(&self, key: &StageKey, status: &mut StageStatus) {
        status.current_freight = None;
        // Replay oldest-first so history's top-down order matches the
        // available stack's.
        let passing: Vec<Freight> = status.available_freight.iter().rev().cloned().collect();
        for mut freight in passing {
            freight.qualified = true;
            let freight_id = freight.id.clone();
            if status.history.try_push(freight) {
                self.events.emit(ReconcileEvent::FreightQualified {
                    stage: key.clone(),
                    freight_id,
                });
            }
        }
    }

    /// Creates the Promotion order, treating a name collision as
    /// pre-existing intent.
    async fn create_promotion(
        &self,
        token: &CancellationToken,
        stage: &Stage,
        freight_id: &str,
    ) -> Result<(), ReconcileError> {
        if freight_id.len() < 7 {
            // Unknown ID shape; promote anyway but leave a trace.
            warn!(stage = %stage.key(), freight = %freight_id, "freight id shorter than expected");
        }
        let name = promotion_name(&stage.name, freight_id);
        let promotion = Promotion {
            namespace: stage.namespace.clone(),
            name: name.clone(),
            stage: stage.name.clone(),
            freight_id: freight_id.to_string(),
            state: PromotionState::Pending,
        };

        token.ensure_active()?;
        match self.store.create_promotion(token, promotion).await {
            Ok(()) => {
                info!(stage = %stage.key(), promotion = %name, freight = %freight_id, "created promotion");
                self.events.emit(ReconcileEvent::PromotionCreated {
                    stage: stage.key(),
                    promotion: name,
                    freight_id: freight_id.to_string(),
                });
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                debug!(stage = %stage.key(), promotion = %name, "promotion already exists");
                Ok(())
            }
            Err(source) => Err(ReconcileError::PromotionCreate { name, source }),
        }
    }
}
