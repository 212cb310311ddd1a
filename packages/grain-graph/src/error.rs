//! Typed errors for the grain graph library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can decide
//! per failure family whether a run continues.

use thiserror::Error;

/// Errors from a [`TextSource`](crate::traits::source::TextSource).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success status code
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Page text below the usable minimum
    #[error("content too short ({len} chars) at {url}")]
    TooShort { url: String, len: usize },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors from the LLM-facing collaborators (extractor and topic judge).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response did not have a recognizable structure
    #[error("malformed extraction: {0}")]
    Malformed(String),
}

/// Errors from a [`LedgerWriter`](crate::traits::ledger::LedgerWriter).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Connection failed or timed out
    #[error("ledger network error: {0}")]
    Network(String),

    /// The ledger answered but refused the write
    #[error("ledger rejected write (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The write succeeded but no created object id came back
    #[error("ledger response carried no record id")]
    MissingId,

    /// Local journal I/O failed
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload (de)serialization failed
    #[error("ledger payload error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Whether retrying the same write could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Network(_) | LedgerError::Io(_) => true,
            LedgerError::Rejected { status, .. } => *status == 429 || *status >= 500,
            LedgerError::MissingId | LedgerError::Json(_) => false,
        }
    }
}

/// Errors persisting the topic index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index persist error: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extractor and judge operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for ledger writes.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type alias for index persistence.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_transience() {
        assert!(LedgerError::Network("timeout".into()).is_transient());
        assert!(LedgerError::Rejected { status: 503, message: String::new() }.is_transient());
        assert!(!LedgerError::Rejected { status: 400, message: "bad vector".into() }.is_transient());
        assert!(!LedgerError::MissingId.is_transient());
    }
}
