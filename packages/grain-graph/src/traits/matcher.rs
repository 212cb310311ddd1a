//! Topic matching strategy.

use async_trait::async_trait;

use crate::types::{claim::ClaimId, topic::TopicEntry};

/// Finds an already minted topic that a new label should attach to.
///
/// `entries` are in index order, oldest first. Matching is best-effort;
/// an implementation that cannot decide returns `None` and the builder
/// mints a new root.
#[async_trait]
pub trait TopicMatcher: Send + Sync {
    async fn find_match(&self, label: &str, entries: &[TopicEntry]) -> Option<ClaimId>;

    /// Get the policy name (for logging).
    fn name(&self) -> &str;
}
