use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use grain_graph::ingestors::http::DEFAULT_READER_URL;
use grain_graph::MatchPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which ledger writer a run records claims with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerKind {
    /// Local JSONL journal
    #[default]
    Journal,
    /// Signing relay in front of the chain
    Relay,
}

impl FromStr for LedgerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "journal" | "local" => Ok(LedgerKind::Journal),
            "relay" | "chain" => Ok(LedgerKind::Relay),
            other => Err(format!("unknown ledger '{}' (expected journal or relay)", other)),
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LedgerKind::Journal => "journal",
            LedgerKind::Relay => "relay",
        })
    }
}

/// Relay settings, present when the relay ledger is usable.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub package_id: String,
    pub module: String,
    pub function: String,
    pub explorer_url: Option<String>,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub index_path: PathBuf,
    pub ledger: LedgerKind,
    pub journal_path: PathBuf,
    pub relay: Option<RelayConfig>,
    pub match_policy: MatchPolicy,
    /// `None` fetches pages directly
    pub reader_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ledger = match get("GRAIN_LEDGER") {
            Some(value) => value
                .parse::<LedgerKind>()
                .map_err(anyhow::Error::msg)
                .context("GRAIN_LEDGER must be journal or relay")?,
            None => LedgerKind::default(),
        };

        let match_policy = match get("GRAIN_MATCH_POLICY") {
            Some(value) => value
                .parse::<MatchPolicy>()
                .map_err(anyhow::Error::msg)
                .context("GRAIN_MATCH_POLICY must be containment, exact or semantic")?,
            None => MatchPolicy::default(),
        };

        let relay = match (get("GRAIN_RELAY_URL"), get("GRAIN_PACKAGE_ID")) {
            (Some(url), Some(package_id)) => Some(RelayConfig {
                url,
                package_id,
                module: get("GRAIN_MODULE").unwrap_or_else(|| "core".to_string()),
                function: get("GRAIN_FUNCTION").unwrap_or_else(|| "mint_grain".to_string()),
                explorer_url: get("GRAIN_EXPLORER_URL"),
            }),
            (Some(_), None) => bail!("GRAIN_PACKAGE_ID must be set when GRAIN_RELAY_URL is"),
            _ => None,
        };

        let reader_url = match get("GRAIN_READER_URL") {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(value),
            None => Some(DEFAULT_READER_URL.to_string()),
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            index_path: get("GRAIN_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("local_memory.json")),
            ledger,
            journal_path: get("GRAIN_JOURNAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ledger.jsonl")),
            relay,
            match_policy,
            reader_url,
        })
    }

    /// The relay settings, or an error naming what is missing.
    pub fn require_relay(&self) -> Result<&RelayConfig> {
        self.relay
            .as_ref()
            .context("GRAIN_RELAY_URL and GRAIN_PACKAGE_ID must be set for the relay ledger")
    }

    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY must be set")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.index_path, PathBuf::from("local_memory.json"));
        assert_eq!(config.ledger, LedgerKind::Journal);
        assert_eq!(config.match_policy, MatchPolicy::Containment);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.reader_url.as_deref(), Some(DEFAULT_READER_URL));
        assert!(config.relay.is_none());
        assert!(config.require_openai_key().is_err());
    }

    #[test]
    fn test_relay_settings() {
        let config = config(&[
            ("GRAIN_LEDGER", "relay"),
            ("GRAIN_RELAY_URL", "http://localhost:8787"),
            ("GRAIN_PACKAGE_ID", "0xpkg"),
            ("GRAIN_EXPLORER_URL", "https://suiscan.xyz/testnet"),
            ("GRAIN_READER_URL", "none"),
        ])
        .unwrap();

        let relay = config.require_relay().unwrap();
        assert_eq!(config.ledger, LedgerKind::Relay);
        assert_eq!(relay.module, "core");
        assert_eq!(relay.function, "mint_grain");
        assert_eq!(relay.explorer_url.as_deref(), Some("https://suiscan.xyz/testnet"));
        assert!(config.reader_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[("GRAIN_LEDGER", "paper")]).is_err());
        assert!(config(&[("GRAIN_MATCH_POLICY", "fuzzy")]).is_err());
        assert!(config(&[("GRAIN_RELAY_URL", "http://localhost:8787")]).is_err());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config(&[("OPENAI_API_KEY", "  "), ("GRAIN_INDEX_PATH", "")]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.index_path, PathBuf::from("local_memory.json"));
    }
}
