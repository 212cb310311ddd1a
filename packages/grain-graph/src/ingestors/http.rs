//! HTTP text source.
//!
//! Tries a reader proxy first (it renders the page and answers with clean
//! markdown), then falls back to fetching the page directly and stripping
//! the HTML down to text.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::source::TextSource;

/// Public reader proxy; the target URL is appended to it.
pub const DEFAULT_READER_URL: &str = "https://r.jina.ai/";

/// Longest text handed to the extractor.
pub const DEFAULT_MAX_CHARS: usize = 10_000;

/// Shorter pages are treated as a failed fetch.
pub const DEFAULT_MIN_CHARS: usize = 50;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

lazy_static! {
    // Whole blocks that never carry article text
    static ref STRIP_BLOCKS: Vec<Regex> = [
        r"(?is)<script[^>]*>.*?</script>",
        r"(?is)<style[^>]*>.*?</style>",
        r"(?is)<noscript[^>]*>.*?</noscript>",
        r"(?is)<nav[^>]*>.*?</nav>",
        r"(?is)<header[^>]*>.*?</header>",
        r"(?is)<footer[^>]*>.*?</footer>",
        r"(?s)<!--.*?-->",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    static ref HEADING: Regex = Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap();
    static ref PARAGRAPH: Regex = Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"(?is)<li[^>]*>(.*?)</li>").unwrap();
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref INLINE_SPACE: Regex = Regex::new(r"[ \t\r\f]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n+").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
}

/// Reduce an HTML page to readable text, one block per line.
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    for pattern in STRIP_BLOCKS.iter() {
        text = pattern.replace_all(&text, "").to_string();
    }

    text = HEADING.replace_all(&text, "\n$1\n").to_string();
    text = PARAGRAPH.replace_all(&text, "$1\n").to_string();
    text = LIST_ITEM.replace_all(&text, "- $1\n").to_string();
    text = LINE_BREAK.replace_all(&text, "\n").to_string();
    text = ANY_TAG.replace_all(&text, "").to_string();

    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    text = INLINE_SPACE.replace_all(&text, " ").to_string();
    text = BLANK_LINES.replace_all(&text, "\n").to_string();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page title, if the HTML has one.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Text source fetching pages over HTTP.
///
/// # Example
///
/// ```rust,ignore
/// use grain_graph::ingestors::HttpTextSource;
///
/// let source = HttpTextSource::new().with_max_chars(8_000);
/// let text = source.fetch("https://abmedia.io/some-article").await?;
/// ```
pub struct HttpTextSource {
    client: Client,
    reader_url: Option<String>,
    max_chars: usize,
    min_chars: usize,
}

impl Default for HttpTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTextSource {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            reader_url: Some(DEFAULT_READER_URL.to_string()),
            max_chars: DEFAULT_MAX_CHARS,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }

    /// Use a different reader proxy, or `None` to always fetch directly.
    pub fn with_reader_url(mut self, reader_url: Option<String>) -> Self {
        self.reader_url = reader_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn get_text(&self, url: &str, user_agent: Option<&str>) -> FetchResult<String> {
        let mut request = self.client.get(url);
        if let Some(agent) = user_agent {
            request = request.header("User-Agent", agent);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            FetchError::Http(Box::new(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }

    async fn fetch_via_reader(&self, reader: &str, url: &str) -> FetchResult<String> {
        let text = self.get_text(&format!("{}{}", reader, url), None).await?;
        Ok(text.trim().to_string())
    }

    async fn fetch_direct(&self, url: &str) -> FetchResult<String> {
        let html = self.get_text(url, Some(BROWSER_USER_AGENT)).await?;
        let body = html_to_text(&html);
        Ok(match extract_title(&html) {
            Some(title) if !body.starts_with(&title) => format!("{}\n{}", title, body),
            _ => body,
        })
    }

    fn finish(&self, url: &str, text: &str) -> FetchResult<String> {
        let len = text.chars().count();
        if len < self.min_chars {
            return Err(FetchError::TooShort {
                url: url.to_string(),
                len,
            });
        }
        Ok(truncate_chars(text, self.max_chars).to_string())
    }
}

#[async_trait]
impl TextSource for HttpTextSource {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        if let Some(reader) = &self.reader_url {
            match self.fetch_via_reader(reader, url).await {
                Ok(text) => match self.finish(url, &text) {
                    Ok(text) => {
                        info!(url = %url, chars = text.chars().count(), via = "reader", "Fetched page text");
                        return Ok(text);
                    }
                    Err(e) => debug!(url = %url, error = %e, "Reader text unusable, fetching directly"),
                },
                Err(e) => debug!(url = %url, error = %e, "Reader fetch failed, fetching directly"),
            }
        }

        let text = self.fetch_direct(url).await?;
        let text = self.finish(url, &text)?;
        info!(url = %url, chars = text.chars().count(), via = "direct", "Fetched page text");
        Ok(text)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"
            <html><head><title>ETF flows</title><style>p { color: red; }</style></head>
            <body>
              <nav><a href="/">Home</a></nav>
              <h1>Bitcoin ETF outflows</h1>
              <p>Spot ETFs saw &amp; reported <b>$1B</b> in outflows.</p>
              <ul><li>IBIT</li><li>FBTC</li></ul>
              <script>track();</script>
            </body></html>
        "#;

        let text = html_to_text(html);

        assert!(text.contains("Bitcoin ETF outflows"));
        assert!(text.contains("Spot ETFs saw & reported $1B in outflows."));
        assert!(text.contains("- IBIT"));
        assert!(!text.contains("track()"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Home"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<html><head><title> Page Title </title></head></html>"),
            Some("Page Title".to_string())
        );
        assert_eq!(extract_title("<html><body>No title</body></html>"), None);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("比特幣現貨", 2), "比特");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_finish_enforces_bounds() {
        let source = HttpTextSource::new().with_max_chars(60);

        assert!(matches!(
            source.finish("https://a", "tiny"),
            Err(FetchError::TooShort { len: 4, .. })
        ));

        let long = "x".repeat(200);
        assert_eq!(source.finish("https://a", &long).unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_invalid_urls_are_rejected_before_fetching() {
        let source = HttpTextSource::new();
        assert!(matches!(
            source.fetch("not a url").await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            source.fetch("ftp://example.com/file").await,
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_fallback() {
        let source = HttpTextSource::new().with_reader_url(Some("http://127.0.0.1:9/".into()));
        let result = source.fetch("http://127.0.0.1:9/article").await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
