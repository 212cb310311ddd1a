//! Ledger Writer implementations.
//!
//! - [`RelayLedger`]: posts the mint call to an HTTP relay that signs and
//!   submits the on-chain transaction
//! - [`JournalLedger`]: append-only local JSONL file, for dry runs
//! - [`RetryingLedger`]: wraps either one with bounded retries

mod journal;
mod relay;
mod retry;

pub use journal::{JournalLedger, JournalRecord};
pub use relay::{MintTarget, RelayLedger};
pub use retry::{RetryPolicy, RetryingLedger};
