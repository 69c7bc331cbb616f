//! Bounded retry loop with exponential backoff for transient failures.
//!
//! [`run_with_retry`] wraps a unit of work and re-runs it when the supplied
//! classifier reports the failure as transient. The loop is strictly
//! sequential within one logical operation: an attempt either completes,
//! aborts the operation, or schedules the next attempt after a backoff
//! delay. Cancellation short-circuits everything — it consumes no attempt
//! and never reaches the classifier.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::constants::{BACKOFF_BASE, BACKOFF_CAP};
use super::error::TransferError;

/// Largest exponent applied to the backoff base; keeps the shift in range
/// long before the cap takes over.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Verdict produced by a retry classifier for a failed attempt.
#[derive(Debug)]
pub enum RetryVerdict {
    /// Transient failure: sleep and try again.
    Retry,
    /// Terminal failure: stop retrying. When the classifier located the
    /// terminal condition nested inside the raised error, it supplies a
    /// structured replacement to surface instead of the outer wrapper.
    Abort(Option<TransferError>),
}

/// Exponential backoff schedule: `base * 2^attempt`, capped.
///
/// With the default 1-second base, delays run 1s, 2s, 4s, 8s, ... up to the
/// 64-second ceiling.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: BACKOFF_BASE,
            cap: BACKOFF_CAP,
        }
    }
}

impl Backoff {
    /// Creates a schedule with a custom base and ceiling.
    #[must_use]
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Returns the delay before the attempt following failed attempt
    /// `attempt` (0-indexed): `delay(0)` = base, `delay(3)` = 8 × base.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let multiplier = 1u32 << exponent;
        self.base.saturating_mul(multiplier).min(self.cap)
    }
}

/// Runs `action` up to `max_attempts` times, consulting `classify` on each
/// failure.
///
/// - `RetryVerdict::Abort` propagates immediately (with the classifier's
///   replacement error, when supplied).
/// - `RetryVerdict::Retry` sleeps `backoff.delay(n)` and re-runs, unless the
///   attempt budget is exhausted, in which case the last error propagates
///   as-is.
/// - Cancellation — the token firing between attempts or during the backoff
///   sleep, or the action itself returning [`TransferError::Cancelled`] —
///   aborts without consuming an attempt and without invoking `classify`.
///
/// # Errors
///
/// Returns the terminal [`TransferError`] per the rules above.
pub async fn run_with_retry<T, A, C>(
    max_attempts: u32,
    backoff: &Backoff,
    cancel: &CancellationToken,
    mut action: A,
    mut classify: C,
) -> Result<T, TransferError>
where
    A: AsyncFnMut() -> Result<T, TransferError>,
    C: FnMut(&TransferError) -> RetryVerdict,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let error = match action().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if error.is_cancelled() {
            return Err(error);
        }

        match classify(&error) {
            RetryVerdict::Abort(replacement) => {
                return Err(replacement.unwrap_or(error));
            }
            RetryVerdict::Retry => {
                attempt += 1;
                if attempt >= max_attempts {
                    debug!(attempt, max_attempts, "retry budget exhausted");
                    return Err(error);
                }
                let delay = backoff.delay(attempt - 1);
                debug!(
                    attempt,
                    next_attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "transient failure, will retry"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(TransferError::Cancelled),
                    () = sleep(delay) => {}
                }
            }
        }
    }
}
