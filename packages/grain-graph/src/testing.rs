//! Testing utilities including mock implementations.
//!
//! These let applications and tests drive the builder and pipeline without
//! network, LLM, or ledger access. Every mock is cheap to clone and clones
//! share state, so a test can hand one copy to the code under test and keep
//! another for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{
    ExtractError, ExtractResult, FetchError, FetchResult, LedgerError, LedgerResult,
};
use crate::traits::{
    extractor::{ClaimExtractor, TopicJudge},
    ledger::LedgerWriter,
    source::TextSource,
};
use crate::types::{
    claim::{Claim, ClaimId},
    extraction::Extraction,
    topic::TopicEntry,
};

// =============================================================================
// Ledger
// =============================================================================

/// A mock ledger that assigns sequential ids (`0xmock1`, `0xmock2`, ...).
///
/// Every attempted write is logged, including the ones configured to fail.
#[derive(Clone, Default)]
pub struct MockLedger {
    calls: Arc<RwLock<Vec<Claim>>>,
    recorded: Arc<RwLock<Vec<(ClaimId, Claim)>>>,
    fail_contents: Arc<RwLock<HashSet<String>>>,
    fail_all: Arc<RwLock<bool>>,
    next_id: Arc<RwLock<usize>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose content equals `content`.
    pub fn fail_on(self, content: impl Into<String>) -> Self {
        self.fail_contents.write().unwrap().insert(content.into());
        self
    }

    /// Reject every write.
    pub fn failing(self) -> Self {
        *self.fail_all.write().unwrap() = true;
        self
    }

    /// Every claim submitted, in order.
    pub fn calls(&self) -> Vec<Claim> {
        self.calls.read().unwrap().clone()
    }

    /// Successful writes with their ids, in order.
    pub fn recorded(&self) -> Vec<(ClaimId, Claim)> {
        self.recorded.read().unwrap().clone()
    }

    /// Ids handed out so far.
    pub fn issued_ids(&self) -> Vec<ClaimId> {
        self.recorded().into_iter().map(|(id, _)| id).collect()
    }

    /// Submitted claims with the given content.
    pub fn calls_for(&self, content: &str) -> Vec<Claim> {
        self.calls()
            .into_iter()
            .filter(|c| c.content == content)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
        self.recorded.write().unwrap().clear();
    }
}

#[async_trait]
impl LedgerWriter for MockLedger {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId> {
        self.calls.write().unwrap().push(claim.clone());

        let rejected = *self.fail_all.read().unwrap()
            || self.fail_contents.read().unwrap().contains(&claim.content);
        if rejected {
            return Err(LedgerError::Rejected {
                status: 500,
                message: format!("mock rejection: {}", claim.content),
            });
        }

        let id = {
            let mut next = self.next_id.write().unwrap();
            *next += 1;
            ClaimId::new(format!("0xmock{}", *next))
        };

        self.recorded
            .write()
            .unwrap()
            .push((id.clone(), claim.clone()));
        Ok(id)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// A mock extractor returning predefined extractions by input text.
#[derive(Clone, Default)]
pub struct MockExtractor {
    extractions: Arc<RwLock<HashMap<String, Extraction>>>,
    fallback: Arc<RwLock<Option<Extraction>>>,
    failing: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `extraction` when asked about exactly `text`.
    pub fn with_extraction(self, text: impl Into<String>, extraction: Extraction) -> Self {
        self.extractions
            .write()
            .unwrap()
            .insert(text.into(), extraction);
        self
    }

    /// Return `extraction` for any text without a specific entry.
    pub fn with_fallback(self, extraction: Extraction) -> Self {
        *self.fallback.write().unwrap() = Some(extraction);
        self
    }

    /// Simulate an unavailable AI service.
    pub fn failing(self) -> Self {
        *self.failing.write().unwrap() = true;
        self
    }

    /// Texts the extractor was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ClaimExtractor for MockExtractor {
    async fn extract(&self, text: &str) -> ExtractResult<Extraction> {
        self.calls.write().unwrap().push(text.to_string());

        if *self.failing.read().unwrap() {
            return Err(ExtractError::AI("mock AI unavailable".into()));
        }

        Ok(self
            .extractions
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .or_else(|| self.fallback.read().unwrap().clone())
            .unwrap_or_default())
    }
}

// =============================================================================
// Judge
// =============================================================================

/// Record of a call made to the mock judge.
#[derive(Debug, Clone)]
pub struct MockJudgeCall {
    pub label: String,
    pub candidate_count: usize,
}

/// A mock topic judge answering from a label → id table.
#[derive(Clone, Default)]
pub struct MockJudge {
    answers: Arc<RwLock<HashMap<String, Option<ClaimId>>>>,
    failing: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<MockJudgeCall>>>,
}

impl MockJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `id` (or "no match") when judging `label`.
    pub fn with_answer(self, label: impl Into<String>, id: Option<&str>) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(label.into(), id.map(ClaimId::from));
        self
    }

    pub fn failing(self) -> Self {
        *self.failing.write().unwrap() = true;
        self
    }

    pub fn calls(&self) -> Vec<MockJudgeCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl TopicJudge for MockJudge {
    async fn judge(&self, label: &str, candidates: &[TopicEntry]) -> ExtractResult<Option<ClaimId>> {
        self.calls.write().unwrap().push(MockJudgeCall {
            label: label.to_string(),
            candidate_count: candidates.len(),
        });

        if *self.failing.read().unwrap() {
            return Err(ExtractError::AI("mock judge unavailable".into()));
        }

        Ok(self.answers.read().unwrap().get(label).cloned().flatten())
    }
}

// =============================================================================
// Text source
// =============================================================================

/// A mock text source serving predefined pages.
///
/// Unknown URLs fail with HTTP 404.
#[derive(Clone, Default)]
pub struct MockTextSource {
    pages: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), text.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl TextSource for MockTextSource {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::BondType;

    #[tokio::test]
    async fn test_mock_ledger_sequential_ids_and_failures() {
        let ledger = MockLedger::new().fail_on("bad");

        let a = ledger.write(&Claim::genesis("a", "u")).await.unwrap();
        assert!(ledger.write(&Claim::genesis("bad", "u")).await.is_err());
        let b = ledger
            .write(&Claim::child("b", BondType::Derived, a.clone(), "u"))
            .await
            .unwrap();

        assert_eq!(a, ClaimId::new("0xmock1"));
        assert_eq!(b, ClaimId::new("0xmock2"));
        assert_eq!(ledger.calls().len(), 3);
        assert_eq!(ledger.recorded().len(), 2);
        assert_eq!(ledger.calls_for("bad").len(), 1);
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let ledger = MockLedger::new();
        let handle = ledger.clone();
        ledger.write(&Claim::genesis("a", "u")).await.unwrap();
        assert_eq!(handle.issued_ids(), vec![ClaimId::new("0xmock1")]);
    }

    #[tokio::test]
    async fn test_mock_extractor_fallback_and_default() {
        let extractor = MockExtractor::new();
        assert_eq!(extractor.extract("anything").await.unwrap(), Extraction::Empty);

        let failing = MockExtractor::new().failing();
        assert!(failing.extract("anything").await.is_err());
        assert_eq!(failing.calls(), vec!["anything".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_text_source_unknown_url() {
        let source = MockTextSource::new().with_page("https://a", "text");
        assert_eq!(source.fetch("https://a").await.unwrap(), "text");
        assert!(matches!(
            source.fetch("https://b").await,
            Err(FetchError::Status { status: 404, .. })
        ));
    }
}
