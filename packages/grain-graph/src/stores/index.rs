//! Bounded, append-only list of minted topics.

use tracing::{debug, warn};

use crate::error::IndexResult;
use crate::traits::store::IndexStore;
use crate::types::topic::TopicEntry;

/// Retention bound used unless configured otherwise.
pub const DEFAULT_INDEX_CAPACITY: usize = 20;

/// The most recent `capacity` topics, oldest first.
///
/// Entries are never edited in place. Appending past the bound evicts from
/// the front. Duplicate labels are allowed.
#[derive(Debug, Clone)]
pub struct TopicIndex {
    entries: Vec<TopicEntry>,
    capacity: usize,
}

impl Default for TopicIndex {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_CAPACITY)
    }
}

impl TopicIndex {
    /// Create an empty index. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build from stored entries, keeping only the newest `capacity`.
    ///
    /// Entries with a blank id or label can never be a valid parent and are
    /// dropped.
    pub fn from_entries(entries: Vec<TopicEntry>, capacity: usize) -> Self {
        let total = entries.len();
        let entries: Vec<TopicEntry> = entries
            .into_iter()
            .filter(|e| !e.id.as_str().trim().is_empty() && !e.content.trim().is_empty())
            .collect();
        if entries.len() < total {
            warn!(dropped = total - entries.len(), "Ignoring blank topic index entries");
        }

        let mut index = Self::new(capacity);
        index.entries = entries;
        index.evict_overflow();
        index
    }

    /// Load from a store. Unreadable storage yields an empty index.
    pub fn load(store: &dyn IndexStore, capacity: usize) -> Self {
        let index = Self::from_entries(store.load(), capacity);
        debug!(entries = index.len(), capacity = index.capacity, "Topic index loaded");
        index
    }

    /// Write the full sequence back to a store.
    pub fn persist(&self, store: &dyn IndexStore) -> IndexResult<()> {
        store.save(&self.entries)
    }

    /// Append an entry, returning whatever was evicted to stay in bounds.
    pub fn append(&mut self, entry: TopicEntry) -> Vec<TopicEntry> {
        self.entries.push(entry);
        self.evict_overflow()
    }

    /// The newest `limit` entries, oldest first.
    pub fn candidates(&self, limit: usize) -> &[TopicEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[TopicEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_overflow(&mut self) -> Vec<TopicEntry> {
        let excess = self.entries.len().saturating_sub(self.capacity);
        self.entries.drain(..excess).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryIndexStore;
    use proptest::prelude::*;

    fn entry(n: usize) -> TopicEntry {
        TopicEntry::new(format!("0x{:02}", n), format!("topic {}", n))
    }

    #[test]
    fn test_append_evicts_oldest_past_capacity() {
        let mut index = TopicIndex::new(20);
        for n in 0..20 {
            assert!(index.append(entry(n)).is_empty());
        }

        let evicted = index.append(entry(20));

        assert_eq!(index.len(), 20);
        assert_eq!(evicted, vec![entry(0)]);
        assert_eq!(index.entries().first(), Some(&entry(1)));
        assert_eq!(index.entries().last(), Some(&entry(20)));
    }

    #[test]
    fn test_from_entries_trims_to_newest() {
        let index = TopicIndex::from_entries((0..25).map(entry).collect(), 20);
        assert_eq!(index.len(), 20);
        assert_eq!(index.entries()[0], entry(5));
    }

    #[test]
    fn test_blank_entries_are_dropped_on_load() {
        let store = MemoryIndexStore::with_entries(vec![
            TopicEntry::new("", "Bitcoin"),
            entry(1),
            TopicEntry::new("0xfeed", "  "),
            TopicEntry::new("  ", "xAI"),
        ]);

        let index = TopicIndex::load(&store, 20);

        assert_eq!(index.entries(), &[entry(1)]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut index = TopicIndex::new(5);
        index.append(TopicEntry::new("0xa", "Bitcoin"));
        index.append(TopicEntry::new("0xb", "Bitcoin"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_candidates_are_newest() {
        let index = TopicIndex::from_entries((0..6).map(entry).collect(), 20);
        let candidates = index.candidates(2);
        assert_eq!(candidates, &[entry(4), entry(5)]);
        assert_eq!(index.candidates(100).len(), 6);
    }

    #[test]
    fn test_zero_capacity_still_holds_latest() {
        let mut index = TopicIndex::new(0);
        index.append(entry(1));
        index.append(entry(2));
        assert_eq!(index.entries(), &[entry(2)]);
    }

    #[test]
    fn test_persist_and_load_through_store() {
        let store = MemoryIndexStore::new();
        let mut index = TopicIndex::new(3);
        for n in 0..4 {
            index.append(entry(n));
        }
        index.persist(&store).unwrap();

        let reloaded = TopicIndex::load(&store, 3);
        assert_eq!(reloaded.entries(), &[entry(1), entry(2), entry(3)]);

        // A smaller bound on reload trims further
        let narrower = TopicIndex::load(&store, 2);
        assert_eq!(narrower.entries(), &[entry(2), entry(3)]);
    }

    proptest! {
        #[test]
        fn prop_index_keeps_newest_within_bound(capacity in 1usize..30, appends in 0usize..80) {
            let mut index = TopicIndex::new(capacity);
            for n in 0..appends {
                index.append(entry(n));
            }

            prop_assert_eq!(index.len(), appends.min(capacity));
            let expected: Vec<TopicEntry> =
                (appends.saturating_sub(capacity)..appends).map(entry).collect();
            prop_assert_eq!(index.entries(), expected.as_slice());
        }
    }
}
