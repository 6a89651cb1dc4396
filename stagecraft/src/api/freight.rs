//! Freight: immutable artifact bundles flowing between Stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint;

/// A git commit discovered from a repository subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    /// URL of the repository the commit was discovered in.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// The commit SHA.
    pub id: String,
    /// Branch the commit was discovered on, if the subscription tracks one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Extra detail the discoverer chose to attach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CommitMetadata>,
}

impl GitCommit {
    /// Creates a commit reference.
    #[must_use]
    pub fn new(repo_url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            id: id.into(),
            branch: None,
            metadata: None,
        }
    }
}

/// Optional commit detail a git discoverer may attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMetadata {
    /// Author line of the commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Subject line of the commit message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A container image discovered from an image repository subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// URL of the image repository.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// The discovered tag.
    pub tag: String,
    /// Content digest of the tag at discovery time, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl Image {
    /// Creates an image reference.
    #[must_use]
    pub fn new(repo_url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            tag: tag.into(),
            digest: None,
        }
    }
}

/// A Helm chart version discovered from a chart registry subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// URL of the chart registry.
    #[serde(rename = "registryURL")]
    pub registry_url: String,
    /// Chart name within the registry.
    pub name: String,
    /// The discovered version.
    pub version: String,
}

impl Chart {
    /// Creates a chart reference.
    #[must_use]
    pub fn new(
        registry_url: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry_url: registry_url.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

/// An immutable bundle of artifacts eligible to occupy a Stage.
///
/// The `id` is derived from the artifact content alone, so two bundles with
/// the same commits, images, and charts are the same Freight no matter when
/// or where they were assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freight {
    /// Content-derived fingerprint.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// When this bundle was first materialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    /// Git commits in the bundle, sorted by repository URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<GitCommit>,
    /// Container images in the bundle, sorted by (repository URL, tag).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    /// Helm charts in the bundle, sorted by (registry URL, name).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<Chart>,
    /// Whether this Freight has been deemed safe to propagate downstream.
    #[serde(default)]
    pub qualified: bool,
}

impl Freight {
    /// Builds a bundle from discovered artifacts, stamping its content
    /// fingerprint and first-seen time.
    #[must_use]
    pub fn from_artifacts(commits: Vec<GitCommit>, images: Vec<Image>, charts: Vec<Chart>) -> Self {
        let id = fingerprint::freight_id(&commits, &images, &charts);
        Self {
            id,
            first_seen: Some(Utc::now()),
            commits,
            images,
            charts,
            qualified: false,
        }
    }
}

/// Bounded stack of Freight, newest at the top (index 0).
///
/// Depth is capped; pushing beyond the cap evicts the oldest entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreightStack(Vec<Freight>);

impl FreightStack {
    /// Maximum retained depth.
    pub const MAX_DEPTH: usize = 10;

    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The newest entry, if any.
    #[must_use]
    pub fn top(&self) -> Option<&Freight> {
        self.0.first()
    }

    /// Whether any entry carries the given ID.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.0.iter().any(|f| f.id == id)
    }

    /// Pushes freight onto the top, evicting the oldest entry beyond
    /// [`Self::MAX_DEPTH`].
    pub fn push(&mut self, freight: Freight) {
        self.0.insert(0, freight);
        self.0.truncate(Self::MAX_DEPTH);
    }

    /// Pushes only when no entry with the same ID is already present.
    ///
    /// Returns whether the freight was pushed. The existing entry wins, so
    /// the first occurrence's `first_seen` is preserved.
    pub fn try_push(&mut self, freight: Freight) -> bool {
        if self.contains_id(&freight.id) {
            return false;
        }
        self.push(freight);
        true
    }

    /// Iterates entries newest-first.
    pub fn iter(&self) -> std::slice::Iter<'_, Freight> {
        self.0.iter()
    }

    /// Borrows the entries newest-first.
    #[must_use]
    pub fn as_slice(&self) -> &[Freight] {
        &self.0
    }
}

impl From<Vec<Freight>> for FreightStack {
    fn from(entries: Vec<Freight>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a FreightStack {
    type Item = &'a Freight;
    type IntoIter = std::slice::Iter<'a, Freight>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
