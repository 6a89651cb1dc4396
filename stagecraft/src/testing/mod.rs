//! Test doubles and fixtures for exercising the reconciler.
//!
//! Available outside `cfg(test)` so downstream crates can test against the
//! same doubles.

mod fixtures;
mod mocks;

pub use fixtures::{commit_freight, StageFixture, FIXTURE_NAMESPACE, FIXTURE_STAGE};
pub use mocks::{
    FaultyControlPlane, MockDiscovery, MockHealthEvaluator, MockUpstreamSource,
};
