// Coffer: bounded retry
//
// Used only when acquiring the database at startup. Nothing inside the
// vault store or token codec retries.

use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E: std::error::Error + 'static> {
    #[error("attempts count can't be 0")]
    NoAttempts,

    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
}

/// Call `f` up to `attempts` times, sleeping `delay` after each failure.
/// Returns the first success, or the last error once every attempt failed.
pub fn do_with_tries<T, E, F>(attempts: u32, delay: Duration, f: F) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Result<T, E>,
{
    if attempts == 0 {
        return Err(RetryError::NoAttempts);
    }

    // The first call is not a retry.
    let backoff = ConstantBuilder::default()
        .with_delay(delay)
        .with_max_times((attempts - 1) as usize);

    f.retry(backoff)
        .notify(|e: &E, after: Duration| {
            tracing::debug!(error = %e, retry_in = ?after, "attempt failed, retrying");
        })
        .call()
        .map_err(|source| RetryError::Exhausted { attempts, source })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
