//! Retry for provider calls: exponential backoff with jitter, honoring the
//! server's `retry_after` hint on rate limits.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ChatError;

/// How often and how patiently a failed provider call is repeated.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Upper bound for any single wait, server hints included.
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out. The last error is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ChatError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChatError>>,
    {
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            let wait = self.delay_for(attempt, &err);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "provider call failed, retrying"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    /// Wait before attempt `attempt + 1`.
    ///
    /// A rate limit with a `retry_after` hint waits exactly that long;
    /// otherwise the exponential backoff is jittered to 75%..125%.
    /// Both are capped at `max_backoff`.
    pub fn delay_for(&self, attempt: u32, err: &ChatError) -> Duration {
        if let ChatError::RateLimited {
            retry_after_ms: Some(ms),
        } = err
        {
            return Duration::from_millis(*ms).min(self.max_backoff);
        }
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let jittered = base * rand::random_range(0.75..=1.25);
        Duration::from_secs_f64(jittered.min(self.max_backoff.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let calls = AtomicU32::new(0);
        let value = fast_policy(3)
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ChatError::api(503, "busy"))
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let err = fast_policy(3)
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::api(400, "bad request"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Api { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rate_limit_hint_is_honored_and_capped() {
        let policy = RetryPolicy::default();
        let hinted = ChatError::RateLimited {
            retry_after_ms: Some(1_500),
        };
        assert_eq!(policy.delay_for(1, &hinted), Duration::from_millis(1_500));

        let huge = ChatError::RateLimited {
            retry_after_ms: Some(10 * 60 * 1000),
        };
        assert_eq!(policy.delay_for(1, &huge), policy.max_backoff);
    }

    #[test]
    fn backoff_grows_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        let err = ChatError::api(503, "busy");
        for (attempt, base_ms) in [(1, 500.0), (2, 1_000.0), (3, 2_000.0)] {
            let ms = policy.delay_for(attempt, &err).as_secs_f64() * 1000.0;
            assert!(ms >= base_ms * 0.75 - 1.0 && ms <= base_ms * 1.25 + 1.0, "attempt {attempt}: {ms}");
        }
        assert!(policy.delay_for(40, &err) <= policy.max_backoff);
    }
}
