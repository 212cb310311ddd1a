//! HTTP relay ledger.
//!
//! The relay holds the signing key and exposes a single endpoint:
//!
//! ```text
//! POST {endpoint}/mint
//! {
//!   "target": "{package}::{module}::{function}",
//!   "arguments": {
//!     "content": "...",
//!     "parents": ["0x..."],
//!     "bond_type": 1,
//!     "source_url": "https://...",
//!     "clock": "0x6"
//!   }
//! }
//! ```
//!
//! and answers `{"object_id": "0x...", "digest": "..."}` once the
//! transaction has executed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::traits::ledger::LedgerWriter;
use crate::types::claim::{Claim, ClaimId};

/// Shared clock object passed to every mint call.
const CLOCK_OBJECT_ID: &str = "0x6";

/// The on-chain function a claim is minted through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTarget {
    pub package_id: String,
    pub module: String,
    pub function: String,
}

impl MintTarget {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            module: "core".to_string(),
            function: "mint_grain".to_string(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Fully qualified `package::module::function`.
    pub fn qualified(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.function)
    }
}

#[derive(Debug, Serialize)]
struct MintArguments<'a> {
    content: &'a str,
    parents: Vec<&'a str>,
    bond_type: u8,
    source_url: &'a str,
    clock: &'a str,
}

#[derive(Debug, Serialize)]
struct MintRequest<'a> {
    target: String,
    arguments: MintArguments<'a>,
}

#[derive(Debug, Deserialize)]
struct MintResponse {
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    digest: Option<String>,
}

fn mint_request<'a>(target: &MintTarget, claim: &'a Claim) -> MintRequest<'a> {
    MintRequest {
        target: target.qualified(),
        arguments: MintArguments {
            content: &claim.content,
            parents: claim.parent_ids.iter().map(ClaimId::as_str).collect(),
            bond_type: claim.bond_type.as_u8(),
            source_url: &claim.source_url,
            clock: CLOCK_OBJECT_ID,
        },
    }
}

fn parse_mint_response(body: &str) -> LedgerResult<(ClaimId, Option<String>)> {
    let response: MintResponse = serde_json::from_str(body)?;
    let id = response
        .object_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(LedgerError::MissingId)?;
    Ok((ClaimId::new(id), response.digest))
}

/// Ledger writer backed by a signing relay.
#[derive(Debug, Clone)]
pub struct RelayLedger {
    client: Client,
    endpoint: String,
    target: MintTarget,
    explorer_url: Option<String>,
}

impl RelayLedger {
    pub fn new(endpoint: impl Into<String>, target: MintTarget) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            target,
            explorer_url: None,
        }
    }

    /// Log a transaction link under this explorer base after each mint.
    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn target(&self) -> &MintTarget {
        &self.target
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LedgerWriter for RelayLedger {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId> {
        let request = mint_request(&self.target, claim);

        debug!(
            target_fn = %request.target,
            bond_type = request.arguments.bond_type,
            parents = request.arguments.parents.len(),
            "Submitting mint"
        );

        let response = self
            .client
            .post(format!("{}/mint", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Relay request failed");
                LedgerError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let (id, digest) = parse_mint_response(&body)?;

        match (&self.explorer_url, &digest) {
            (Some(explorer), Some(digest)) => {
                info!(id = %id, tx = %format!("{}/tx/{}", explorer, digest), "Claim minted")
            }
            _ => info!(id = %id, digest = ?digest, "Claim minted"),
        }

        Ok(id)
    }

    fn name(&self) -> &str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::BondType;

    #[test]
    fn test_mint_request_shape() {
        let target = MintTarget::new("0xpkg");
        let claim = Claim::child(
            "Bitcoin: Bullish",
            BondType::Contradicts,
            ClaimId::new("0xroot"),
            "https://abmedia.io/a",
        );

        let json = serde_json::to_value(mint_request(&target, &claim)).unwrap();

        assert_eq!(json["target"], "0xpkg::core::mint_grain");
        assert_eq!(json["arguments"]["parents"], serde_json::json!(["0xroot"]));
        assert_eq!(json["arguments"]["bond_type"], 3);
        assert_eq!(json["arguments"]["clock"], "0x6");
        assert_eq!(json["arguments"]["source_url"], "https://abmedia.io/a");
    }

    #[test]
    fn test_root_has_empty_parent_vector() {
        let target = MintTarget::new("0xpkg").with_module("grains").with_function("mint");
        let claim = Claim::genesis("Bitcoin", "u");

        let json = serde_json::to_value(mint_request(&target, &claim)).unwrap();

        assert_eq!(json["target"], "0xpkg::grains::mint");
        assert_eq!(json["arguments"]["parents"], serde_json::json!([]));
        assert_eq!(json["arguments"]["bond_type"], 0);
    }

    #[test]
    fn test_parse_mint_response() {
        let (id, digest) = parse_mint_response(r#"{"object_id":"0xabc","digest":"9xYz"}"#).unwrap();
        assert_eq!(id, ClaimId::new("0xabc"));
        assert_eq!(digest.as_deref(), Some("9xYz"));

        assert!(matches!(
            parse_mint_response(r#"{"digest":"9xYz"}"#),
            Err(LedgerError::MissingId)
        ));
        assert!(matches!(
            parse_mint_response(r#"{"object_id":"  "}"#),
            Err(LedgerError::MissingId)
        ));
        assert!(matches!(parse_mint_response("<html>"), Err(LedgerError::Json(_))));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transient() {
        let ledger = RelayLedger::new("http://127.0.0.1:9/", MintTarget::new("0xpkg"));
        assert_eq!(ledger.endpoint(), "http://127.0.0.1:9");

        let err = ledger.write(&Claim::genesis("Bitcoin", "u")).await.unwrap_err();

        assert!(matches!(err, LedgerError::Network(_)));
        assert!(err.is_transient());
    }
}
