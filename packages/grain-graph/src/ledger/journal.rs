//! Local journal ledger.
//!
//! Appends one JSON object per accepted claim to a file. Ids look like
//! on-chain object ids (`0x` + 32 hex chars) so a journal run can be
//! compared against a relay run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::ledger::LedgerWriter;
use crate::types::claim::{Claim, ClaimId};

/// One line of the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub id: ClaimId,
    #[serde(flatten)]
    pub claim: Claim,
    pub recorded_at: DateTime<Utc>,
}

/// Ledger writer that records claims in a local JSONL file.
///
/// Like the chain, it refuses claims whose parents it has never recorded.
pub struct JournalLedger {
    path: PathBuf,
    known: Mutex<HashSet<ClaimId>>,
}

impl JournalLedger {
    /// Open (or start) the journal at `path`, loading the ids already in it.
    pub async fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let known = Self::read_all(&path)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect::<HashSet<_>>();

        debug!(path = %path.display(), records = known.len(), "Journal opened");

        Ok(Self {
            path,
            known: Mutex::new(known),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the journal, in write order. A missing file is empty;
    /// unparseable lines are skipped.
    pub async fn read_all(path: &Path) -> LedgerResult<Vec<JournalRecord>> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<JournalRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable journal line");
                    None
                }
            })
            .collect())
    }

    fn mint_id() -> ClaimId {
        ClaimId::new(format!("0x{}", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl LedgerWriter for JournalLedger {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId> {
        let mut known = self.known.lock().await;

        if let Some(missing) = claim.parent_ids.iter().find(|p| !known.contains(*p)) {
            return Err(LedgerError::Rejected {
                status: 400,
                message: format!("unknown parent {}", missing),
            });
        }

        let record = JournalRecord {
            id: Self::mint_id(),
            claim: claim.clone(),
            recorded_at: Utc::now(),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        known.insert(record.id.clone());
        debug!(id = %record.id, bond_type = %claim.bond_type, "Claim journaled");

        Ok(record.id)
    }

    fn name(&self) -> &str {
        "journal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::BondType;

    #[tokio::test]
    async fn test_journal_appends_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.jsonl");

        let ledger = JournalLedger::open(&path).await.unwrap();
        let root = ledger.write(&Claim::genesis("Bitcoin", "u")).await.unwrap();
        let child = ledger
            .write(&Claim::child("Bitcoin: Bullish", BondType::Derived, root.clone(), "u"))
            .await
            .unwrap();

        assert!(root.as_str().starts_with("0x"));
        assert_eq!(root.as_str().len(), 34);
        assert_ne!(root, child);

        let records = JournalLedger::read_all(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].claim.parent_ids, vec![root.clone()]);

        // A reopened journal still knows earlier ids
        let reopened = JournalLedger::open(&path).await.unwrap();
        assert!(reopened
            .write(&Claim::child("more", BondType::Derived, child, "u"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_journal_rejects_unknown_parent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JournalLedger::open(dir.path().join("ledger.jsonl")).await.unwrap();

        let err = ledger
            .write(&Claim::child("orphan", BondType::Derived, ClaimId::new("0xnope"), "u"))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Rejected { status: 400, .. }));
        assert!(!err.is_transient());
        assert!(JournalLedger::read_all(ledger.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_journal_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = JournalLedger::read_all(&dir.path().join("absent.jsonl")).await.unwrap();
        assert!(records.is_empty());
    }
}
