//! Fixed-count retry with linear backoff for outbound provider calls.
//!
//! Both provider clients run every request through [`RetryPolicy::run`]. A
//! failed attempt `n` sleeps `base_delay * n` before attempt `n + 1`. Errors
//! whose text names an authentication or validation problem are returned
//! immediately since repeating the call cannot fix them.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::RequestConfig;

/// Lowercased fragments that mark an error as permanent.
const PERMANENT_ERROR_MARKERS: &[&str] = &[
    "api key",
    "authentication",
    "unauthorized",
    "validation",
];

/// Retry settings for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Why [`RetryPolicy::run`] gave up
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The error was classified as permanent; no further attempt was made.
    Permanent(E),
    /// Every attempt failed with a transient error; holds the last one.
    Exhausted { last: E, attempts: u32 },
}

impl RetryPolicy {
    /// Build a policy from request configuration
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `op` until it succeeds, hits a permanent error, or runs out of attempts
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryFailure<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            let start = Instant::now();
            match op().await {
                Ok(value) => {
                    debug!(
                        call = label,
                        attempt,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Provider call succeeded"
                    );
                    return Ok(value);
                }
                Err(e) if is_permanent(&e) => {
                    warn!(call = label, attempt, error = %e, "Provider call failed permanently");
                    return Err(RetryFailure::Permanent(e));
                }
                Err(e) => {
                    warn!(
                        call = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Provider call failed"
                    );
                    if attempt >= self.max_attempts {
                        return Err(RetryFailure::Exhausted {
                            last: e,
                            attempts: attempt,
                        });
                    }
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Whether an error's text marks it as not worth retrying
pub fn is_permanent<E: Display>(err: &E) -> bool {
    let text = err.to_string().to_lowercase();
    PERMANENT_ERROR_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_permanent_markers() {
        assert!(is_permanent(&"API error: 401 - Invalid API key"));
        assert!(is_permanent(&"Validation failed for field"));
        assert!(is_permanent(&"Authentication required"));
        assert!(!is_permanent(&"API error: 500 - Internal server error"));
        assert!(!is_permanent(&"Request timeout after 5000ms"));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let config = RequestConfig {
            timeout_ms: 1000,
            max_attempts: 0,
            retry_delay_ms: 10,
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<&str, RetryFailure<String>> = fast_policy(3)
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err("API error: 500 - boom".to_string())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), RetryFailure<String>> = fast_policy(3)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("Invalid API key".to_string())
            })
            .await;

        assert!(matches!(result, Err(RetryFailure::Permanent(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_reports_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), RetryFailure<String>> = fast_policy(2)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("connection reset".to_string())
            })
            .await;

        match result {
            Err(RetryFailure::Exhausted { last, attempts }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, "connection reset");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
