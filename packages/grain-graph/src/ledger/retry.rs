//! Bounded retries around a ledger writer.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::LedgerResult;
use crate::traits::ledger::LedgerWriter;
use crate::types::claim::{Claim, ClaimId};

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 500;

/// How often and how patiently a write is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// A single attempt and no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_factor: 1,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1).saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Retries transient failures of the wrapped writer.
///
/// Rejections the ledger will repeat (bad arguments, missing id) are
/// returned immediately. Retrying a write whose response was lost can
/// mint a duplicate; the ledger tolerates that.
pub struct RetryingLedger<L: LedgerWriter> {
    inner: L,
    policy: RetryPolicy,
}

impl<L: LedgerWriter> RetryingLedger<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LedgerWriter> LedgerWriter for RetryingLedger<L> {
    async fn write(&self, claim: &Claim) -> LedgerResult<ClaimId> {
        let mut attempt = 1;

        loop {
            match self.inner.write(claim).await {
                Ok(id) => return Ok(id),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Ledger write failed, retrying..."
                    );
                    attempt += 1;
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(error = %e, attempt, content = %claim.content, "Ledger write failed");
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
