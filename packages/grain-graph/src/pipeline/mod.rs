//! Per-URL pipeline: fetch, extract, build.
//!
//! One URL never aborts a run. A fetch failure skips the URL, an extractor
//! that finds nothing yields zero writes, and ledger failures are confined
//! to the subtrees they hit.

mod batch;

pub use batch::{read_url_list, BatchConfig, BatchSummary, UrlResult};

use serde::Serialize;
use tracing::{info, warn};

use crate::builder::{BuildReport, ClaimGraphBuilder};
use crate::traits::{
    extractor::ClaimExtractor, ledger::LedgerWriter, matcher::TopicMatcher, source::TextSource,
    store::IndexStore,
};

/// What happened to one URL.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The page could not be fetched; nothing was extracted or written
    Skipped { reason: String },
    /// The extractor itself failed
    ExtractFailed { reason: String },
    /// The extractor found no claims
    NoClaims,
    /// Claims were written (possibly with partial failures)
    Built { report: BuildReport },
}

impl RunOutcome {
    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            RunOutcome::Built { report } => Some(report),
            _ => None,
        }
    }

    pub fn write_count(&self) -> usize {
        self.report().map(BuildReport::write_count).unwrap_or(0)
    }
}

/// Ties a text source and an extractor to a claim graph builder.
pub struct Pipeline<T, X, L, M, S>
where
    T: TextSource,
    X: ClaimExtractor,
    L: LedgerWriter,
    M: TopicMatcher,
    S: IndexStore,
{
    source: T,
    extractor: X,
    builder: ClaimGraphBuilder<L, M, S>,
}

impl<T, X, L, M, S> Pipeline<T, X, L, M, S>
where
    T: TextSource,
    X: ClaimExtractor,
    L: LedgerWriter,
    M: TopicMatcher,
    S: IndexStore,
{
    pub fn new(source: T, extractor: X, builder: ClaimGraphBuilder<L, M, S>) -> Self {
        Self {
            source,
            extractor,
            builder,
        }
    }

    pub fn builder(&self) -> &ClaimGraphBuilder<L, M, S> {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut ClaimGraphBuilder<L, M, S> {
        &mut self.builder
    }

    /// Fetch `url`, extract its claims and write them.
    pub async fn run_url(&mut self, url: &str) -> RunOutcome {
        info!(url = %url, source = self.source.name(), "Processing URL");

        let text = match self.source.fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed, skipping URL");
                return RunOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        self.run_text(&text, url).await
    }

    /// Extract and write claims from text already at hand.
    pub async fn run_text(&mut self, text: &str, source_url: &str) -> RunOutcome {
        let extraction = match self.extractor.extract(text).await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(url = %source_url, error = %e, "Extraction failed");
                return RunOutcome::ExtractFailed {
                    reason: e.to_string(),
                };
            }
        };

        if extraction.is_empty() {
            info!(url = %source_url, "No claims extracted");
            return RunOutcome::NoClaims;
        }

        let report = self.builder.build(&extraction, source_url).await;
        RunOutcome::Built { report }
    }
}
