//! Bounded retry with exponential backoff.
//!
//! Reservation writes go through [`retry_with_backoff`] so that a dropped
//! database connection does not lose a booking. Reads are never retried.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait `base * 2^attempt` after failed attempt number `attempt` (1-based).
    Exponential { base: Duration },
}

impl Backoff {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Exponential { base } => base.saturating_mul(2u32.saturating_pow(attempt)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy for inserting reservations: 3 attempts, waiting 2s then 4s.
    pub fn reservation_writes() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential { base: Duration::from_secs(1) },
        }
    }

    /// Same attempt budget without any waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, backoff: Backoff::None }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reservation_writes()
    }
}

/// Runs `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the attempt budget is spent. The last error is returned
/// unchanged.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= max_attempts || !should_retry(&err) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Operation failed, giving up"
                    );
                    return Err(err);
                }

                let delay = policy.backoff.delay_after(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ConnectionFault, StoreError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Fails with `error` on the first `failures` calls, then returns the attempt number.
    async fn run_failing(
        policy: RetryPolicy,
        failures: u32,
        error: StoreError,
    ) -> (Result<u32, StoreError>, u32) {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_with_backoff(
            &policy,
            "test_insert",
            move || {
                let error = error.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n <= failures {
                        Err(error)
                    } else {
                        Ok(n)
                    }
                }
            },
            StoreError::is_retryable,
        )
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    fn reset() -> StoreError {
        StoreError::transient(ConnectionFault::Reset, "read: connection reset by peer")
    }

    #[test]
    fn test_exponential_delays() {
        let backoff = RetryPolicy::reservation_writes().backoff;
        assert_eq!(backoff.delay_after(1), Duration::from_secs(2));
        assert_eq!(backoff.delay_after(2), Duration::from_secs(4));
        assert_eq!(backoff.delay_after(3), Duration::from_secs(8));
        assert_eq!(Backoff::None.delay_after(3), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_try_without_waiting() {
        let start = Instant::now();
        let (result, calls) = run_failing(RetryPolicy::reservation_writes(), 0, reset()).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls, 1);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let start = Instant::now();
        let (result, calls) = run_failing(RetryPolicy::reservation_writes(), 2, reset()).await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);

        // 2s after the first failure, 4s after the second.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        for failures in [3, 5] {
            let (result, calls) = run_failing(RetryPolicy::reservation_writes(), failures, reset()).await;
            assert_eq!(result, Err(reset()));
            assert_eq!(calls, 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_connection_is_retried() {
        let lost = StoreError::transient(ConnectionFault::Lost, "server has gone away");
        let (result, calls) = run_failing(RetryPolicy::reservation_writes(), 1, lost).await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_is_not_retried() {
        let duplicate = StoreError::Query("Duplicate entry '1' for key 'PRIMARY'".into());
        let start = Instant::now();
        let (result, calls) = run_failing(RetryPolicy::reservation_writes(), 2, duplicate.clone()).await;
        assert_eq!(result, Err(duplicate));
        assert_eq!(calls, 1);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_still_runs_once() {
        let (result, calls) = run_failing(RetryPolicy::immediate(0), 1, reset()).await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
