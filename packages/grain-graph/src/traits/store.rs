//! Persistence for the Topic Index.

use crate::error::IndexResult;
use crate::types::topic::TopicEntry;

/// Durable storage behind a [`TopicIndex`](crate::stores::TopicIndex).
///
/// `load` never fails: absent or unreadable storage is an empty index.
pub trait IndexStore: Send + Sync {
    fn load(&self) -> Vec<TopicEntry>;

    /// Replace the stored sequence. A crash mid-save must leave either the
    /// previous or the new content.
    fn save(&self, entries: &[TopicEntry]) -> IndexResult<()>;

    fn clear(&self) -> IndexResult<()>;
}
