//! Ledger Writer trait.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::types::claim::{Claim, ClaimId};

/// Durably records a claim and returns the id the ledger assigned.
///
/// One call is one logical write. Whether that involves retries is up to
/// the implementation (see [`RetryingLedger`](crate::ledger::RetryingLedger)).
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId>;

    /// Get the writer name (for logging).
    fn name(&self) -> &str;
}

#[async_trait]
impl<L: LedgerWriter + ?Sized> LedgerWriter for std::sync::Arc<L> {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId> {
        (**self).write(claim).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
