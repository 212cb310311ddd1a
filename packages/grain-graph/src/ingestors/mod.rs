//! Text Source implementations.

pub mod http;

pub use http::HttpTextSource;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::traits::source::TextSource;

/// Serves the same caller-supplied text for any URL.
///
/// Used when the article text is already at hand (pasted, or read from a
/// file) and only the source URL is needed for provenance.
#[derive(Debug, Clone)]
pub struct StaticTextSource {
    text: String,
}

impl StaticTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextSource for StaticTextSource {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(FetchError::TooShort {
                url: url.to_string(),
                len: 0,
            });
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticTextSource::new("  Tether invests in Anchorage Digital.  ");
        assert_eq!(
            source.fetch("https://a").await.unwrap(),
            "Tether invests in Anchorage Digital."
        );
        assert!(StaticTextSource::new(" ").fetch("https://a").await.is_err());
    }
}
