//! Sequential batch runs over a URL list.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::info;

use super::{Pipeline, RunOutcome};
use crate::traits::{
    extractor::ClaimExtractor, ledger::LedgerWriter, matcher::TopicMatcher, source::TextSource,
    store::IndexStore,
};

/// Batch pacing.
///
/// After a URL that produced nothing the pause grows by `backoff_factor`,
/// up to `max_delay`. A URL that builds resets it.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause between consecutive URLs
    pub delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2,
        }
    }
}

impl BatchConfig {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor.max(1);
        self
    }

    /// Pause to use after a URL, given the pause used before it.
    pub fn next_delay(&self, current: Duration, built: bool) -> Duration {
        if built {
            self.delay
        } else {
            current
                .saturating_mul(self.backoff_factor.max(1))
                .min(self.max_delay.max(self.delay))
        }
    }
}

/// Outcome for one URL of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct UrlResult {
    pub url: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Per-URL outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub results: Vec<UrlResult>,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !matches!(r.outcome, RunOutcome::Built { .. }))
            .count()
    }

    pub fn total_writes(&self) -> usize {
        self.results.iter().map(|r| r.outcome.write_count()).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.results
            .iter()
            .filter_map(|r| r.outcome.report())
            .map(|report| report.failures.len())
            .sum()
    }
}

impl<T, X, L, M, S> Pipeline<T, X, L, M, S>
where
    T: TextSource,
    X: ClaimExtractor,
    L: LedgerWriter,
    M: TopicMatcher,
    S: IndexStore,
{
    /// Process `urls` one at a time, sharing the topic index across them.
    pub async fn run_batch(&mut self, urls: &[String], config: &BatchConfig) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut delay = config.delay;

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                sleep(delay).await;
            }

            info!(url = %url, position = i + 1, total = urls.len(), "Batch item");
            let outcome = self.run_url(url).await;
            delay = config.next_delay(delay, matches!(outcome, RunOutcome::Built { .. }));
            summary.results.push(UrlResult {
                url: url.clone(),
                outcome,
            });
        }

        info!(
            processed = summary.processed(),
            skipped = summary.skipped(),
            writes = summary.total_writes(),
            "Batch complete"
        );

        summary
    }
}

/// Read URLs from a file, one per line. Blank lines and `#` comments are
/// ignored.
pub fn read_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_url_list(&text))
}

fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_backs_off_and_resets() {
        let config = BatchConfig::default();
        let one = Duration::from_secs(1);

        assert_eq!(config.next_delay(one, false), Duration::from_secs(2));
        assert_eq!(config.next_delay(Duration::from_secs(20), false), Duration::from_secs(30));
        assert_eq!(config.next_delay(Duration::from_secs(16), true), one);

        let none = BatchConfig::default().with_delay(Duration::ZERO);
        assert_eq!(none.next_delay(Duration::ZERO, false), Duration::ZERO);
    }

    #[test]
    fn test_parse_url_list() {
        let text = "# ETF coverage\nhttps://a.example/1\n\n  https://a.example/2  \n#https://skipped\n";
        assert_eq!(
            parse_url_list(text),
            vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()]
        );
    }

    #[test]
    fn test_read_url_list_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://a.example/1\n").unwrap();
        assert_eq!(read_url_list(&path).unwrap().len(), 1);
        assert!(read_url_list(&dir.path().join("missing.txt")).is_err());
    }
}
