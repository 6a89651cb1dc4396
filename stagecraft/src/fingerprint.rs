//! Content fingerprinting for Freight bundles.
//!
//! The fingerprint covers the identity fields of each artifact only:
//! `repoURL:commitID` for commits, `repoURL:tag` for images, and
//! `registryURL/name:version` for charts. First-seen times, qualification,
//! branches, digests, and other transient metadata never participate, so
//! equal logical content yields equal IDs regardless of list ordering.

use sha2::{Digest, Sha256};

use crate::api::{Chart, GitCommit, Image};

/// Computes the deterministic Freight ID over an artifact tuple.
#[must_use]
pub fn freight_id(commits: &[GitCommit], images: &[Image], charts: &[Chart]) -> String {
    let mut artifacts: Vec<String> =
        Vec::with_capacity(commits.len() + images.len() + charts.len());
    for commit in commits {
        artifacts.push(format!("{}:{}", commit.repo_url, commit.id));
    }
    for image in images {
        artifacts.push(format!("{}:{}", image.repo_url, image.tag));
    }
    for chart in charts {
        artifacts.push(format!("{}/{}:{}", chart.registry_url, chart.name, chart.version));
    }
    artifacts.sort();

    let canonical = serde_json::to_string(&artifacts).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shortened fingerprint used in promotion names.
///
/// Tolerates malformed IDs (too short, or not ASCII hex) by returning the
/// input untouched rather than panicking.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commits() -> Vec<GitCommit> {
        vec![
            GitCommit::new("https://example.com/a.git", "1111111"),
            GitCommit::new("https://example.com/b.git", "2222222"),
        ]
    }

    fn sample_images() -> Vec<Image> {
        vec![
            Image::new("example.com/app", "v1.0.0"),
            Image::new("example.com/sidecar", "v2.3.4"),
        ]
    }

    fn sample_charts() -> Vec<Chart> {
        vec![Chart::new("https://charts.example.com", "app", "1.2.3")]
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = freight_id(&sample_commits(), &sample_images(), &sample_charts());
        let b = freight_id(&sample_commits(), &sample_images(), &sample_charts());
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let id = freight_id(&sample_commits(), &[], &[]);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_stable_under_reordering() {
        let mut commits = sample_commits();
        commits.reverse();
        let mut images = sample_images();
        images.reverse();

        let reordered = freight_id(&commits, &images, &sample_charts());
        let sorted = freight_id(&sample_commits(), &sample_images(), &sample_charts());
        assert_eq!(reordered, sorted);
    }

    #[test]
    fn test_fingerprint_differs_on_content() {
        let base = freight_id(&sample_commits(), &sample_images(), &sample_charts());

        let mut commits = sample_commits();
        commits[0].id = "fffffff".to_string();
        let changed = freight_id(&commits, &sample_images(), &sample_charts());
        assert_ne!(base, changed);
    }

    #[test]
    fn test_fingerprint_ignores_transient_fields() {
        let plain = freight_id(&sample_commits(), &sample_images(), &[]);

        let mut commits = sample_commits();
        commits[0].branch = Some("main".to_string());
        commits[1].metadata = Some(crate::api::CommitMetadata {
            author: Some("dev".to_string()),
            message: Some("fix".to_string()),
        });
        let mut images = sample_images();
        images[0].digest = Some("sha256:abcdef".to_string());

        assert_eq!(plain, freight_id(&commits, &images, &[]));
    }

    #[test]
    fn test_fingerprint_of_empty_tuple_is_stable() {
        assert_eq!(freight_id(&[], &[], &[]), freight_id(&[], &[], &[]));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdef0123456789"), "abcdef0");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }
}
