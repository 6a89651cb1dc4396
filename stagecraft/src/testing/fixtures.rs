//! Stage and Freight fixtures for reconciler tests.

use crate::api::{
    Freight, FreightStack, GitCommit, PromotionMechanisms, RepoSubscriptions, Stage,
    StageStatus, StageSubscription, Subscriptions,
};

/// Default namespace used by fixtures.
pub const FIXTURE_NAMESPACE: &str = "fake-namespace";

/// Default Stage name used by fixtures.
pub const FIXTURE_STAGE: &str = "fake-stage";

/// Builder for Stage fixtures.
#[derive(Debug)]
pub struct StageFixture {
    stage: Stage,
}

impl Default for StageFixture {
    fn default() -> Self {
        Self {
            stage: Stage {
                namespace: FIXTURE_NAMESPACE.to_string(),
                name: FIXTURE_STAGE.to_string(),
                ..Stage::default()
            },
        }
    }
}

impl StageFixture {
    /// Creates a fixture named `fake-stage` in `fake-namespace`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the Stage name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.stage.name = name.into();
        self
    }

    /// Subscribes the Stage to artifact repositories.
    #[must_use]
    pub fn subscribed_to_repos(mut self) -> Self {
        self.stage.spec.subscriptions = Subscriptions {
            repos: Some(RepoSubscriptions::default()),
            upstream_stages: Vec::new(),
        };
        self
    }

    /// Subscribes the Stage to the named upstream Stages.
    #[must_use]
    pub fn subscribed_to_upstreams(mut self, names: &[&str]) -> Self {
        self.stage.spec.subscriptions = Subscriptions {
            repos: None,
            upstream_stages: names
                .iter()
                .map(|name| StageSubscription::new(*name))
                .collect(),
        };
        self
    }

    /// Gives the Stage promotion mechanisms (it is not control-flow).
    #[must_use]
    pub fn with_promotion_mechanisms(mut self) -> Self {
        self.stage.spec.promotion_mechanisms = Some(PromotionMechanisms::default());
        self
    }

    /// Sets the current Freight.
    #[must_use]
    pub fn with_current_freight(mut self, freight: Freight) -> Self {
        self.stage.status.current_freight = Some(freight);
        self
    }

    /// Pre-populates the available-freight stack, top first.
    #[must_use]
    pub fn with_available_freight(mut self, freight: Vec<Freight>) -> Self {
        self.stage.status.available_freight = FreightStack::from(freight);
        self
    }

    /// Replaces the whole status.
    #[must_use]
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.stage.status = status;
        self
    }

    /// Builds the Stage.
    #[must_use]
    pub fn build(self) -> Stage {
        self.stage
    }
}

/// Freight carrying a single commit, with a content-derived ID.
#[must_use]
pub fn commit_freight(repo_url: &str, commit_id: &str) -> Freight {
    let mut freight =
        Freight::from_artifacts(vec![GitCommit::new(repo_url, commit_id)], vec![], vec![]);
    freight.qualified = true;
    freight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_defaults() {
        let stage = StageFixture::new().build();
        assert_eq!(stage.namespace, FIXTURE_NAMESPACE);
        assert_eq!(stage.name, FIXTURE_STAGE);
        assert!(stage.is_control_flow());
    }

    #[test]
    fn test_fixture_upstream_subscriptions() {
        let stage = StageFixture::new()
            .subscribed_to_upstreams(&["one", "two"])
            .build();
        assert_eq!(stage.spec.subscriptions.upstream_stages.len(), 2);
        assert!(stage.spec.subscriptions.repos.is_none());
    }

    #[test]
    fn test_commit_freight_has_stable_id() {
        let a = commit_freight("fake-url", "fake-commit");
        let b = commit_freight("fake-url", "fake-commit");
        assert_eq!(a.id, b.id);
        assert!(a.qualified);
    }
}
