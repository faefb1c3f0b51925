// SPDX-License-Identifier: MIT

//! Generic retry-with-backoff combinator: the retry loop shape recurs across
//! a few call sites, so it is expressed once as a small reusable combinator.
//! Used by [`crate::handlers::LifecycleHandlers`] for `compactionCompleted`'s
//! tablet-server notification and `cancelCompaction`'s compactor fan-out.

use std::future::Future;
use std::time::Duration;

use crate::error::RuntimeError;

/// Retry `attempt` up to `budget` additional times after the first failure,
/// doubling the delay between tries up to `max_backoff`. Returns the first
/// success, or the last error wrapped in [`RuntimeError::RetryExhausted`]
/// once the budget is spent.
///
/// `budget = 0` means try exactly once with no retries.
pub async fn retry_with_backoff<F, Fut, T>(
    mut attempt: F,
    initial_backoff: Duration,
    max_backoff: Duration,
    budget: u32,
) -> Result<T, RuntimeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RuntimeError>>,
{
    let mut backoff = initial_backoff;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if attempts > budget => {
                return Err(RuntimeError::RetryExhausted { attempts, source: Box::new(err) })
            }
            Err(_) => {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }
}
