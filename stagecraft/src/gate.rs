//! Auto-promotion gating.
//!
//! The gate decides whether a reconcile pass may create a Promotion. Every
//! negative outcome is a suppression, not an error: erring here would cause
//! requeue storms over what is ordinary configuration state.

use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::api::{Stage, StageStatus};
use crate::cancellation::CancellationToken;
use crate::errors::ReconcileError;
use crate::fingerprint;
use crate::store::ControlPlane;

/// Length of the random suffix on promotion names.
const NONCE_LEN: usize = 5;

/// Why the gate declined to auto-promote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// This pass produced no new top-of-stack Freight.
    NoNewFreight,
    /// The Stage subscribes to multiple upstream Stages; advancing it
    /// requires a manual choice.
    MultipleUpstreams,
    /// No promotion policy selects this Stage.
    NoPolicy,
    /// More than one policy selects this Stage.
    AmbiguousPolicy,
    /// The matching policy does not enable auto-promotion.
    AutoPromotionDisabled,
    /// The candidate Freight already occupies the Stage.
    AlreadyCurrent,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNewFreight => write!(f, "no new freight"),
            Self::MultipleUpstreams => write!(f, "multiple upstream stages"),
            Self::NoPolicy => write!(f, "no promotion policy"),
            Self::AmbiguousPolicy => write!(f, "multiple promotion policies"),
            Self::AutoPromotionDisabled => write!(f, "auto-promotion not enabled"),
            Self::AlreadyCurrent => write!(f, "freight already current"),
        }
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Create a Promotion for the Freight with this ID.
    Promote {
        /// ID of the top-of-stack Freight to advance to.
        freight_id: String,
    },
    /// Do not promote.
    Suppress(SuppressReason),
}

/// Policy gate deciding whether a pass may create a Promotion.
pub struct PromotionGate {
    store: Arc<dyn ControlPlane>,
}

impl PromotionGate {
    /// Creates a gate backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ControlPlane>) -> Self {
        Self { store }
    }

    /// Evaluates the gate for one pass.
    ///
    /// `discovered_new` reports whether the available-set update pushed a
    /// new top-of-stack entry. The loop guard has already established that
    /// no Promotion is in flight. Checks that need no store round-trip run
    /// first.
    pub async fn evaluate(
        &self,
        token: &CancellationToken,
        stage: &Stage,
        status: &StageStatus,
        discovered_new: bool,
    ) -> Result<GateDecision, ReconcileError> {
        if !discovered_new {
            return Ok(GateDecision::Suppress(SuppressReason::NoNewFreight));
        }
        if stage.spec.subscriptions.upstream_stages.len() > 1 {
            return Ok(GateDecision::Suppress(SuppressReason::MultipleUpstreams));
        }

        token.ensure_active()?;
        let policies = self
            .store
            .list_promotion_policies(token, &stage.namespace, &stage.name)
            .await
            .map_err(ReconcileError::PolicyLookup)?;
        let policy = match policies.as_slice() {
            [] => return Ok(GateDecision::Suppress(SuppressReason::NoPolicy)),
            [policy] => policy,
            _ => return Ok(GateDecision::Suppress(SuppressReason::AmbiguousPolicy)),
        };
        if !policy.enable_auto_promotion {
            return Ok(GateDecision::Suppress(SuppressReason::AutoPromotionDisabled));
        }

        let Some(candidate) = status.available_freight.top() else {
            return Ok(GateDecision::Suppress(SuppressReason::NoNewFreight));
        };
        if let Some(current) = &status.current_freight {
            if current.id == candidate.id {
                return Ok(GateDecision::Suppress(SuppressReason::AlreadyCurrent));
            }
        }

        Ok(GateDecision::Promote {
            freight_id: candidate.id.clone(),
        })
    }
}

/// Builds the promotion name `<stageName>.<shortFreightID>.<nonce>`.
///
/// The nonce keeps retries on the same Freight from colliding with a
/// Promotion another actor already created for it; a collision on create is
/// pre-existing intent, not a failure.
#[must_use]
pub fn promotion_name(stage: &str, freight_id: &str) -> String {
    format!("{}.{}.{}", stage, fingerprint::short_id(freight_id), nonce())
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        Freight, FreightStack, PromotionPolicy, StageSpec, StageSubscription, Subscriptions,
    };
    use crate::store::InMemoryControlPlane;

    fn policy(name: &str, enabled: bool) -> PromotionPolicy {
        PromotionPolicy {
            namespace: "fake-namespace".to_string(),
            name: name.to_string(),
            stage: "fake-stage".to_string(),
            enable_auto_promotion: enabled,
        }
    }

    fn stage_with_upstreams(count: usize) -> Stage {
        Stage {
            namespace: "fake-namespace".to_string(),
            name: "fake-stage".to_string(),
            spec: StageSpec {
                subscriptions: Subscriptions {
                    repos: None,
                    upstream_stages: (0..count)
                        .map(|i| StageSubscription::new(format!("upstream-{i}")))
                        .collect(),
                },
                ..StageSpec::default()
            },
            ..Stage::default()
        }
    }

    fn status_with_top(id: &str) -> StageStatus {
        StageStatus {
            available_freight: FreightStack::from(vec![Freight {
                id: id.to_string(),
                ..Freight::default()
            }]),
            ..StageStatus::default()
        }
    }

    fn gate() -> (Arc<InMemoryControlPlane>, PromotionGate) {
        let store = Arc::new(InMemoryControlPlane::new());
        let gate = PromotionGate::new(Arc::clone(&store) as Arc<dyn ControlPlane>);
        (store, gate)
    }

    #[tokio::test]
    async fn test_no_new_freight_suppresses() {
        let (_, gate) = gate();
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status_with_top("abc"), false)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Suppress(SuppressReason::NoNewFreight)
        );
    }

    #[tokio::test]
    async fn test_multiple_upstreams_suppress_before_policy_lookup() {
        let (store, gate) = gate();
        store.put_policy(policy("fake-policy", true));
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(2), &status_with_top("abc"), true)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Suppress(SuppressReason::MultipleUpstreams)
        );
    }

    #[tokio::test]
    async fn test_no_policy_suppresses() {
        let (_, gate) = gate();
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status_with_top("abc"), true)
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Suppress(SuppressReason::NoPolicy));
    }

    #[tokio::test]
    async fn test_ambiguous_policy_suppresses() {
        let (store, gate) = gate();
        store.put_policy(policy("fake-policy", true));
        store.put_policy(policy("another-fake-policy", true));
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status_with_top("abc"), true)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Suppress(SuppressReason::AmbiguousPolicy)
        );
    }

    #[tokio::test]
    async fn test_disabled_policy_suppresses() {
        let (store, gate) = gate();
        store.put_policy(policy("fake-policy", false));
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status_with_top("abc"), true)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Suppress(SuppressReason::AutoPromotionDisabled)
        );
    }

    #[tokio::test]
    async fn test_candidate_matching_current_suppresses() {
        let (store, gate) = gate();
        store.put_policy(policy("fake-policy", true));
        let token = CancellationToken::new();

        let mut status = status_with_top("abc");
        status.current_freight = Some(Freight {
            id: "abc".to_string(),
            ..Freight::default()
        });

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status, true)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Suppress(SuppressReason::AlreadyCurrent)
        );
    }

    #[tokio::test]
    async fn test_promotes_top_of_stack() {
        let (store, gate) = gate();
        store.put_policy(policy("fake-policy", true));
        let token = CancellationToken::new();

        let decision = gate
            .evaluate(&token, &stage_with_upstreams(1), &status_with_top("abc"), true)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Promote {
                freight_id: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_promotion_name_shape() {
        let name = promotion_name("fake-stage", "abcdef0123456789");
        let parts: Vec<&str> = name.split('.').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "fake-stage");
        assert_eq!(parts[1], "abcdef0");
        assert_eq!(parts[2].len(), NONCE_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_promotion_name_tolerates_short_ids() {
        let name = promotion_name("fake-stage", "abc");
        assert!(name.starts_with("fake-stage.abc."));
    }

    #[test]
    fn test_nonces_vary_across_retries() {
        let a = promotion_name("fake-stage", "abcdef0123456789");
        let b = promotion_name("fake-stage", "abcdef0123456789");
        // Random suffixes make same-freight retries distinct names.
        assert_ne!(a, b);
    }
}
