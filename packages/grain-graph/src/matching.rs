//! Topic matching policies.
//!
//! Deciding whether "Bitcoin ETF inflow surge" is the same topic as
//! "Bitcoin ETF outflows" is inherently fuzzy. The builder only needs
//! [`TopicMatcher`]; which policy runs is a configuration choice:
//!
//! - [`ContainmentMatcher`]: case-insensitive substring in either direction
//! - [`ExactMatcher`]: case-insensitive equality
//! - [`SemanticMatcher`]: ask an LLM judge over a bounded candidate list

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::traits::{extractor::TopicJudge, matcher::TopicMatcher};
use crate::types::{claim::ClaimId, topic::TopicEntry};

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Loose matching: either label contains the other, ignoring case.
///
/// Favors recall. When several entries match, the newest wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

#[async_trait]
impl TopicMatcher for ContainmentMatcher {
    async fn find_match(&self, label: &str, entries: &[TopicEntry]) -> Option<ClaimId> {
        let needle = normalize(label);
        if needle.is_empty() {
            return None;
        }

        entries
            .iter()
            .rev()
            .find(|entry| {
                let known = normalize(&entry.content);
                !known.is_empty() && (known.contains(&needle) || needle.contains(&known))
            })
            .map(|entry| entry.id.clone())
    }

    fn name(&self) -> &str {
        "containment"
    }
}

/// Strict matching: same label after trimming, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

#[async_trait]
impl TopicMatcher for ExactMatcher {
    async fn find_match(&self, label: &str, entries: &[TopicEntry]) -> Option<ClaimId> {
        let needle = normalize(label);
        if needle.is_empty() {
            return None;
        }

        entries
            .iter()
            .rev()
            .find(|entry| normalize(&entry.content) == needle)
            .map(|entry| entry.id.clone())
    }

    fn name(&self) -> &str {
        "exact"
    }
}

/// Default number of index entries shown to the judge.
pub const DEFAULT_SEMANTIC_CANDIDATES: usize = 20;

/// LLM-assisted matching.
///
/// The judge sees at most `candidate_limit` of the newest entries. Its
/// answer is accepted only if it names one of those candidates, so a
/// hallucinated id can never become a parent.
pub struct SemanticMatcher<J: TopicJudge> {
    judge: J,
    candidate_limit: usize,
}

impl<J: TopicJudge> SemanticMatcher<J> {
    pub fn new(judge: J) -> Self {
        Self {
            judge,
            candidate_limit: DEFAULT_SEMANTIC_CANDIDATES,
        }
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }
}

#[async_trait]
impl<J: TopicJudge> TopicMatcher for SemanticMatcher<J> {
    async fn find_match(&self, label: &str, entries: &[TopicEntry]) -> Option<ClaimId> {
        if entries.is_empty() || label.trim().is_empty() {
            return None;
        }

        let start = entries.len().saturating_sub(self.candidate_limit);
        let candidates = &entries[start..];

        debug!(label = %label, candidates = candidates.len(), "Asking judge for topic match");

        match self.judge.judge(label, candidates).await {
            Ok(Some(id)) => {
                // Hex ids may come back in either case; answer with the stored form
                let chosen = candidates
                    .iter()
                    .find(|c| c.id.as_str().eq_ignore_ascii_case(id.as_str().trim()))
                    .map(|c| c.id.clone());
                if chosen.is_none() {
                    warn!(label = %label, id = %id, "Judge named an id outside the candidate list");
                }
                chosen
            }
            Ok(None) => None,
            Err(e) => {
                warn!(label = %label, error = %e, "Topic judge failed, treating as no match");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "semantic"
    }
}

/// Which matcher a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Containment,
    Exact,
    Semantic,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "containment" | "loose" => Ok(MatchPolicy::Containment),
            "exact" | "strict" => Ok(MatchPolicy::Exact),
            "semantic" | "llm" => Ok(MatchPolicy::Semantic),
            other => Err(format!(
                "unknown match policy '{}' (expected containment, exact or semantic)",
                other
            )),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchPolicy::Containment => "containment",
            MatchPolicy::Exact => "exact",
            MatchPolicy::Semantic => "semantic",
        })
    }
}

/// A matcher chosen at runtime from a [`MatchPolicy`].
pub enum AnyMatcher {
    Containment(ContainmentMatcher),
    Exact(ExactMatcher),
    Semantic(SemanticMatcher<Arc<dyn TopicJudge>>),
}

impl AnyMatcher {
    /// Build the matcher for `policy`. Semantic matching needs a judge;
    /// without one it degrades to containment.
    pub fn from_policy(
        policy: MatchPolicy,
        judge: Option<Arc<dyn TopicJudge>>,
        candidate_limit: usize,
    ) -> Self {
        match (policy, judge) {
            (MatchPolicy::Containment, _) => AnyMatcher::Containment(ContainmentMatcher),
            (MatchPolicy::Exact, _) => AnyMatcher::Exact(ExactMatcher),
            (MatchPolicy::Semantic, Some(judge)) => AnyMatcher::Semantic(
                SemanticMatcher::new(judge).with_candidate_limit(candidate_limit),
            ),
            (MatchPolicy::Semantic, None) => {
                warn!("Semantic matching requested without a judge, using containment");
                AnyMatcher::Containment(ContainmentMatcher)
            }
        }
    }
}

#[async_trait]
impl TopicMatcher for AnyMatcher {
    async fn find_match(&self, label: &str, entries: &[TopicEntry]) -> Option<ClaimId> {
        match self {
            AnyMatcher::Containment(m) => m.find_match(label, entries).await,
            AnyMatcher::Exact(m) => m.find_match(label, entries).await,
            AnyMatcher::Semantic(m) => m.find_match(label, entries).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            AnyMatcher::Containment(m) => m.name(),
            AnyMatcher::Exact(m) => m.name(),
            AnyMatcher::Semantic(m) => m.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockJudge;

    fn index() -> Vec<TopicEntry> {
        vec![
            TopicEntry::new("0xA", "Bitcoin ETF outflows"),
            TopicEntry::new("0xB", "xAI"),
            TopicEntry::new("0xC", "Tether invests in Anchorage Digital"),
        ]
    }

    #[tokio::test]
    async fn test_containment_without_shared_substring_mints() {
        let found = ContainmentMatcher
            .find_match("Bitcoin ETF inflow surge", &index())
            .await;
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_containment_either_direction_ignores_case() {
        // Label contains the stored topic
        let found = ContainmentMatcher
            .find_match("Musk says XAI will hire finance experts", &index())
            .await;
        assert_eq!(found, Some(ClaimId::new("0xB")));

        // Stored topic contains the label
        let found = ContainmentMatcher.find_match("  bitcoin etf ", &index()).await;
        assert_eq!(found, Some(ClaimId::new("0xA")));
    }

    #[tokio::test]
    async fn test_containment_prefers_newest() {
        let entries = vec![
            TopicEntry::new("0xold", "Bitcoin"),
            TopicEntry::new("0xnew", "Bitcoin"),
        ];
        let found = ContainmentMatcher.find_match("Bitcoin", &entries).await;
        assert_eq!(found, Some(ClaimId::new("0xnew")));
    }

    #[tokio::test]
    async fn test_blank_labels_never_match() {
        let mut entries = index();
        entries.push(TopicEntry::new("0xE", ""));
        assert_eq!(ContainmentMatcher.find_match("  ", &entries).await, None);
        assert_eq!(ContainmentMatcher.find_match("Gemini exits UK", &entries).await, None);
        assert_eq!(ExactMatcher.find_match("", &entries).await, None);
    }

    #[tokio::test]
    async fn test_exact_requires_same_label() {
        assert_eq!(ExactMatcher.find_match("bitcoin etf", &index()).await, None);
        assert_eq!(
            ExactMatcher.find_match("XAI ", &index()).await,
            Some(ClaimId::new("0xB"))
        );
    }

    #[tokio::test]
    async fn test_semantic_accepts_candidate_id() {
        let judge = MockJudge::new().with_answer("Bitcoin ETF inflow surge", Some("0xA"));
        let matcher = SemanticMatcher::new(judge.clone());

        let found = matcher.find_match("Bitcoin ETF inflow surge", &index()).await;

        assert_eq!(found, Some(ClaimId::new("0xA")));
        assert_eq!(judge.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_semantic_match_ignores_id_case() {
        let entries = vec![TopicEntry::new("0xabc", "Bitcoin ETF outflows")];
        let judge = MockJudge::new().with_answer("ETF flows", Some("0xABC"));
        let matcher = SemanticMatcher::new(judge);

        let found = matcher.find_match("ETF flows", &entries).await;

        assert_eq!(found, Some(ClaimId::new("0xabc")));
    }

    #[tokio::test]
    async fn test_semantic_rejects_unknown_id() {
        let judge = MockJudge::new().with_answer("Bitcoin", Some("0xDEADBEEF"));
        let matcher = SemanticMatcher::new(judge);
        assert_eq!(matcher.find_match("Bitcoin", &index()).await, None);
    }

    #[tokio::test]
    async fn test_semantic_limits_candidates_and_skips_empty_index() {
        let judge = MockJudge::new();
        let matcher = SemanticMatcher::new(judge.clone()).with_candidate_limit(2);

        assert_eq!(matcher.find_match("anything", &[]).await, None);
        assert!(judge.calls().is_empty());

        // Oldest entry falls outside the window, so naming it is rejected
        let judge = MockJudge::new().with_answer("Bitcoin", Some("0xA"));
        let matcher = SemanticMatcher::new(judge.clone()).with_candidate_limit(2);
        assert_eq!(matcher.find_match("Bitcoin", &index()).await, None);
        assert_eq!(judge.calls()[0].candidate_count, 2);
    }

    #[tokio::test]
    async fn test_semantic_judge_failure_is_no_match() {
        let judge = MockJudge::new().failing();
        let matcher = SemanticMatcher::new(judge);
        assert_eq!(matcher.find_match("xAI", &index()).await, None);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("loose".parse::<MatchPolicy>().unwrap(), MatchPolicy::Containment);
        assert_eq!("Exact".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exact);
        assert_eq!("llm".parse::<MatchPolicy>().unwrap(), MatchPolicy::Semantic);
        assert!("fuzzy".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::Semantic.to_string(), "semantic");
    }

    #[tokio::test]
    async fn test_semantic_policy_without_judge_degrades() {
        let matcher = AnyMatcher::from_policy(MatchPolicy::Semantic, None, 20);
        assert_eq!(matcher.name(), "containment");

        let judge: Arc<dyn TopicJudge> = Arc::new(MockJudge::new().with_answer("xAI news", Some("0xB")));
        let matcher = AnyMatcher::from_policy(MatchPolicy::Semantic, Some(judge), 20);
        assert_eq!(matcher.name(), "semantic");
        assert_eq!(matcher.find_match("xAI news", &index()).await, Some(ClaimId::new("0xB")));
    }
}
