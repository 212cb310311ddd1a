//! LLM-facing traits: claim extraction and topic judging.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::{claim::ClaimId, extraction::Extraction, topic::TopicEntry};

/// Decomposes article text into a claim structure.
///
/// Implementations return [`Extraction::Empty`] for output they cannot
/// read; an `Err` is reserved for the service itself failing.
#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> ExtractResult<Extraction>;
}

/// Decides whether a new topic label belongs to one of the known topics.
///
/// Returns the id of the chosen candidate, or `None` for "no match".
#[async_trait]
pub trait TopicJudge: Send + Sync {
    async fn judge(&self, label: &str, candidates: &[TopicEntry]) -> ExtractResult<Option<ClaimId>>;
}

#[async_trait]
impl<X: ClaimExtractor + ?Sized> ClaimExtractor for std::sync::Arc<X> {
    async fn extract(&self, text: &str) -> ExtractResult<Extraction> {
        (**self).extract(text).await
    }
}

#[async_trait]
impl<J: TopicJudge + ?Sized> TopicJudge for std::sync::Arc<J> {
    async fn judge(&self, label: &str, candidates: &[TopicEntry]) -> ExtractResult<Option<ClaimId>> {
        (**self).judge(label, candidates).await
    }
}
