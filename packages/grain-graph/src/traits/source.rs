//! Text Source trait.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Produces best-effort plain text for a URL.
///
/// A failure means "skip this URL"; it is never fatal to a batch.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<String>;

    /// Get the source name (for logging).
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: TextSource + ?Sized> TextSource for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        (**self).fetch(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
