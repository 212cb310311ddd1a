//! Claim Graph Builder.
//!
//! Turns one [`Extraction`] into ledger writes. Each topic is either reused
//! from the [`TopicIndex`] or minted as a GENESIS claim; everything below it
//! is written parent-first. A node is only ever submitted with parent ids the
//! ledger has already returned, and when a write fails its whole subtree is
//! abandoned while siblings carry on.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::stores::{TopicIndex, DEFAULT_INDEX_CAPACITY};
use crate::traits::{ledger::LedgerWriter, matcher::TopicMatcher, store::IndexStore};
use crate::types::{
    claim::{BondType, Claim, ClaimId, RecordedClaim},
    extraction::{Branch, ClaimNode, Extraction},
    topic::TopicEntry,
};

/// Builder settings.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Retention bound of the topic index
    pub index_capacity: usize,

    /// Attach a DERIVED "Source: <url>" leaf under every terminal claim
    pub provenance_leaves: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            index_capacity: DEFAULT_INDEX_CAPACITY,
            provenance_leaves: false,
        }
    }
}

impl BuilderConfig {
    pub fn with_index_capacity(mut self, capacity: usize) -> Self {
        self.index_capacity = capacity;
        self
    }

    pub fn with_provenance_leaves(mut self, enabled: bool) -> Self {
        self.provenance_leaves = enabled;
        self
    }
}

/// What happened when a topic label was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// An indexed topic matched; nothing was written
    Reused(ClaimId),
    /// A new GENESIS claim was written and indexed
    Minted(ClaimId),
    /// No id could be obtained; descendants must be skipped
    Failed(String),
}

impl TopicOutcome {
    pub fn id(&self) -> Option<&ClaimId> {
        match self {
            TopicOutcome::Reused(id) | TopicOutcome::Minted(id) => Some(id),
            TopicOutcome::Failed(_) => None,
        }
    }
}

/// A node whose write failed, with the size of the subtree given up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub content: String,
    pub depth: u8,
    pub error: String,
    /// Descendants never submitted because of this failure
    pub abandoned: usize,
}

/// Everything one `build` call did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Successful writes, in submission order
    pub written: Vec<RecordedClaim>,
    pub topics_minted: usize,
    pub topics_reused: usize,
    pub failures: Vec<WriteFailure>,
    /// Nodes never submitted (abandoned subtrees and blank nodes)
    pub skipped: usize,
}

impl BuildReport {
    pub fn write_count(&self) -> usize {
        self.written.len()
    }

    /// True when every node was written or reused.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    pub fn written_ids(&self) -> Vec<ClaimId> {
        self.written.iter().map(|r| r.id.clone()).collect()
    }

    fn absorb(&mut self, other: BuildReport) {
        self.written.extend(other.written);
        self.topics_minted += other.topics_minted;
        self.topics_reused += other.topics_reused;
        self.failures.extend(other.failures);
        self.skipped += other.skipped;
    }
}

/// Builds claim graphs against a ledger, deduplicating topics through a
/// local index.
///
/// The builder owns the index for its lifetime and persists it after every
/// newly minted topic.
pub struct ClaimGraphBuilder<L, M, S>
where
    L: LedgerWriter,
    M: TopicMatcher,
    S: IndexStore,
{
    ledger: L,
    matcher: M,
    store: S,
    index: TopicIndex,
    config: BuilderConfig,
}

impl<L, M, S> ClaimGraphBuilder<L, M, S>
where
    L: LedgerWriter,
    M: TopicMatcher,
    S: IndexStore,
{
    /// Create a builder, loading the index from `store`.
    pub fn new(ledger: L, matcher: M, store: S, config: BuilderConfig) -> Self {
        let index = TopicIndex::load(&store, config.index_capacity);
        Self {
            ledger,
            matcher,
            store,
            index,
            config,
        }
    }

    pub fn index(&self) -> &TopicIndex {
        &self.index
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Drop every remembered topic, in memory and in storage.
    pub fn clear_index(&mut self) -> crate::error::IndexResult<()> {
        self.index.clear();
        self.store.clear()
    }

    /// Reuse an indexed topic matching `label`, or mint a new GENESIS claim.
    ///
    /// Zero ledger writes on a match, at most one otherwise. The index only
    /// changes when a mint succeeds.
    pub async fn mint_or_reuse_topic(&mut self, label: &str, source_url: &str) -> TopicOutcome {
        let label = label.trim();
        if label.is_empty() {
            warn!(source_url = %source_url, "Refusing to mint a topic with an empty label");
            return TopicOutcome::Failed("empty topic label".to_string());
        }

        if let Some(id) = self.matcher.find_match(label, self.index.entries()).await {
            info!(
                label = %label,
                topic_id = %id,
                policy = self.matcher.name(),
                "Reusing existing topic"
            );
            return TopicOutcome::Reused(id);
        }

        let claim = Claim::genesis(label, source_url);
        match self.ledger.write(&claim).await {
            Ok(id) => {
                info!(label = %label, topic_id = %id, ledger = self.ledger.name(), "Minted topic");
                let evicted = self.index.append(TopicEntry::new(id.clone(), label));
                if !evicted.is_empty() {
                    debug!(evicted = evicted.len(), "Evicted oldest topics from index");
                }
                if let Err(e) = self.index.persist(&self.store) {
                    warn!(error = %e, "Failed to persist topic index");
                }
                TopicOutcome::Minted(id)
            }
            Err(e) => {
                warn!(label = %label, error = %e, "Topic mint failed, skipping its subtree");
                TopicOutcome::Failed(e.to_string())
            }
        }
    }

    /// Write `branches` (and their leaves) under an already resolved topic.
    ///
    /// Returns the ids written, parents before their children.
    pub async fn expand_topic(
        &self,
        topic_id: &ClaimId,
        branches: &[Branch],
        source_url: &str,
    ) -> Vec<ClaimId> {
        self.expand_into(topic_id, branches, source_url)
            .await
            .written_ids()
    }

    /// Write a whole extraction.
    pub async fn build(&mut self, extraction: &Extraction, source_url: &str) -> BuildReport {
        let mut report = BuildReport::default();

        for tree in extraction.topics() {
            let topic_id = match self.mint_or_reuse_topic(&tree.label, source_url).await {
                TopicOutcome::Reused(id) => {
                    report.topics_reused += 1;
                    id
                }
                TopicOutcome::Minted(id) => {
                    report.topics_minted += 1;
                    report.written.push(RecordedClaim {
                        id: id.clone(),
                        claim: Claim::genesis(tree.label.trim(), source_url),
                        depth: 0,
                    });
                    id
                }
                TopicOutcome::Failed(error) => {
                    let abandoned: usize = tree
                        .branches
                        .iter()
                        .map(|b| self.subtree_size(b))
                        .sum();
                    report.skipped += abandoned;
                    report.failures.push(WriteFailure {
                        content: tree.label.clone(),
                        depth: 0,
                        error,
                        abandoned,
                    });
                    continue;
                }
            };

            let expanded = self.expand_into(&topic_id, &tree.branches, source_url).await;
            report.absorb(expanded);
        }

        info!(
            source_url = %source_url,
            written = report.write_count(),
            minted = report.topics_minted,
            reused = report.topics_reused,
            failures = report.failures.len(),
            skipped = report.skipped,
            "Claim graph built"
        );

        report
    }

    async fn expand_into(
        &self,
        topic_id: &ClaimId,
        branches: &[Branch],
        source_url: &str,
    ) -> BuildReport {
        let mut report = BuildReport::default();

        for branch in branches {
            let branch_node = ClaimNode::new(branch.content.clone(), branch.bond_type);
            let Some(branch_id) = self
                .write_node(&branch_node, topic_id, 1, source_url, self.subtree_size(branch) - 1, &mut report)
                .await
            else {
                continue;
            };

            if branch.leaves.is_empty() {
                self.write_provenance(&branch_id, 2, source_url, &mut report).await;
                continue;
            }

            for leaf in &branch.leaves {
                let provenance = usize::from(self.config.provenance_leaves);
                if let Some(leaf_id) = self
                    .write_node(leaf, &branch_id, 2, source_url, provenance, &mut report)
                    .await
                {
                    self.write_provenance(&leaf_id, 3, source_url, &mut report).await;
                }
            }
        }

        report
    }

    /// Write one node under a resolved parent. On failure the node and its
    /// `descendants` are accounted for and `None` is returned.
    async fn write_node(
        &self,
        node: &ClaimNode,
        parent: &ClaimId,
        depth: u8,
        source_url: &str,
        descendants: usize,
        report: &mut BuildReport,
    ) -> Option<ClaimId> {
        let content = node.content.trim();
        if content.is_empty() {
            report.skipped += 1 + descendants;
            return None;
        }

        let claim = Claim::child(content, node.bond_type, parent.clone(), source_url);
        match self.ledger.write(&claim).await {
            Ok(id) => {
                debug!(
                    id = %id,
                    parent = %parent,
                    depth,
                    bond_type = %node.bond_type,
                    "Claim written"
                );
                report.written.push(RecordedClaim {
                    id: id.clone(),
                    claim,
                    depth,
                });
                Some(id)
            }
            Err(e) => {
                warn!(
                    content = %content,
                    parent = %parent,
                    depth,
                    abandoned = descendants,
                    error = %e,
                    "Claim write failed, abandoning its subtree"
                );
                report.skipped += descendants;
                report.failures.push(WriteFailure {
                    content: content.to_string(),
                    depth,
                    error: e.to_string(),
                    abandoned: descendants,
                });
                None
            }
        }
    }

    async fn write_provenance(
        &self,
        parent: &ClaimId,
        depth: u8,
        source_url: &str,
        report: &mut BuildReport,
    ) {
        if !self.config.provenance_leaves {
            return;
        }
        let node = ClaimNode::new(format!("Source: {}", source_url), BondType::Derived);
        self.write_node(&node, parent, depth, source_url, 0, report)
            .await;
    }

    /// Nodes in a branch including itself and any provenance leaves.
    fn subtree_size(&self, branch: &Branch) -> usize {
        let terminals = branch.leaves.len().max(1);
        let provenance = if self.config.provenance_leaves {
            terminals
        } else {
            0
        };
        1 + branch.leaves.len() + provenance
    }
}
