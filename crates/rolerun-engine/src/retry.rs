//! Retry controller
//!
//! Drives up to [`MAX_RETRIES`] attempts with exponential backoff. Transport
//! faults and empty responses are retried; success returns immediately; an
//! interrupt during an attempt or a backoff wait ends the loop at once.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::console::Console;
use crate::executor::{Fault, Outcome};

/// Attempts per run.
pub const MAX_RETRIES: u32 = 3;

/// Attempt `n > 1` waits `RETRY_DELAY_BASE^n` seconds first.
pub const RETRY_DELAY_BASE: u64 = 2;

/// The operator interrupted the run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted by operator")]
pub struct Interrupted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_base: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay_base: RETRY_DELAY_BASE,
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt` (1-based). The first attempt never waits.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            return None;
        }
        Some(Duration::from_secs(self.delay_base.saturating_pow(attempt)))
    }
}

/// Source of backoff waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// One retryable unit of work. Implementations must start from a clean slate
/// on every call.
#[async_trait]
pub trait Attempt: Send {
    async fn attempt(&mut self, number: u32, console: &mut Console) -> Outcome;
}

/// Run `attempt` under `policy`.
///
/// Returns `Ok(true)` on the first success, `Ok(false)` once the budget is
/// spent. Remediation hints of the final fault are printed after its error
/// line.
///
/// # Errors
///
/// Returns [`Interrupted`] if cancellation is observed during an attempt or
/// a backoff wait.
pub async fn run_with_retry(
    attempt: &mut dyn Attempt,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    console: &mut Console,
    cancel: &CancellationToken,
) -> Result<bool, Interrupted> {
    let max = policy.max_attempts;

    for n in 1..=max {
        if let Some(delay) = policy.delay_for(n) {
            console.announce(&format!(
                "[Retry] Attempt {n}/{max} in {}s...",
                delay.as_secs()
            ));
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Interrupted),
                () = sleeper.sleep(delay) => {}
            }
        }

        debug!(attempt = n, max_attempts = max, "Starting attempt");
        match attempt.attempt(n, console).await {
            Outcome::Success(text) => {
                info!(attempt = n, bytes = text.len(), "Attempt succeeded");
                return Ok(true);
            }
            Outcome::EmptyResponse => {
                debug!(attempt = n, "Empty response; will retry if budget remains");
            }
            Outcome::TransportError(Fault { detail, hints }) => {
                console.report(&format!("[Error] Attempt {n}/{max}: {detail}"));
                if n == max {
                    for hint in hints {
                        console.report(&format!("  → {hint}"));
                    }
                }
            }
            Outcome::Interrupted => return Err(Interrupted),
        }
    }

    console.report("[Error] All retries exhausted.");
    Ok(false)
}
