//! Claim Genealogy Library
//!
//! Turns news articles into a genealogy of claims on an append-only ledger.
//! Each article is decomposed (by an LLM) into topics, positions and
//! supporting claims; every node becomes one ledger record pointing at the
//! records it derives from.
//!
//! # Design
//!
//! - Parents are always written before children, and a child only ever
//!   carries ids the ledger has already returned
//! - Topics are deduplicated across articles through a small local index of
//!   recently minted roots
//! - Collaborators (text source, extractor, matcher, ledger, index storage)
//!   are traits, so every one of them can be swapped or mocked
//!
//! # Usage
//!
//! ```rust,ignore
//! use grain_graph::{
//!     BuilderConfig, ClaimGraphBuilder, ContainmentMatcher, HttpTextSource, JournalLedger,
//!     JsonFileStore, Pipeline,
//! };
//! use grain_graph::ai::OpenAIExtractor;
//!
//! let ledger = JournalLedger::open("ledger.jsonl").await?;
//! let builder = ClaimGraphBuilder::new(
//!     ledger,
//!     ContainmentMatcher,
//!     JsonFileStore::new("local_memory.json"),
//!     BuilderConfig::default(),
//! );
//! let mut pipeline = Pipeline::new(HttpTextSource::new(), OpenAIExtractor::from_env()?, builder);
//!
//! let outcome = pipeline.run_url("https://abmedia.io/some-article").await;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Claims, bond types, extraction shapes, index entries
//! - [`traits`] - Collaborator abstractions
//! - [`builder`] - The claim graph builder
//! - [`matching`] - Topic matching policies
//! - [`stores`] - Topic index and its storage backends
//! - [`ledger`] - Ledger writers (relay, journal, retries)
//! - [`ingestors`] - Text sources
//! - [`pipeline`] - Per-URL and batch orchestration
//! - [`testing`] - Mock implementations for testing

pub mod builder;
pub mod error;
pub mod ingestors;
pub mod ledger;
pub mod matching;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{ExtractError, FetchError, IndexError, LedgerError};
pub use traits::{
    extractor::{ClaimExtractor, TopicJudge},
    ledger::LedgerWriter,
    matcher::TopicMatcher,
    source::TextSource,
    store::IndexStore,
};
pub use types::{
    claim::{BondType, Claim, ClaimId, RecordedClaim},
    extraction::{parse_extraction, Branch, ClaimNode, Entity, Extraction, Stance, TopicTree},
    topic::TopicEntry,
};

pub use builder::{BuildReport, BuilderConfig, ClaimGraphBuilder, TopicOutcome, WriteFailure};
pub use matching::{AnyMatcher, ContainmentMatcher, ExactMatcher, MatchPolicy, SemanticMatcher};
pub use stores::{JsonFileStore, MemoryIndexStore, TopicIndex, DEFAULT_INDEX_CAPACITY};
pub use ledger::{JournalLedger, MintTarget, RelayLedger, RetryPolicy, RetryingLedger};
pub use ingestors::{HttpTextSource, StaticTextSource};
pub use pipeline::{read_url_list, BatchConfig, BatchSummary, Pipeline, RunOutcome, UrlResult};

// Re-export testing utilities
pub use testing::{MockExtractor, MockJudge, MockLedger, MockTextSource};
