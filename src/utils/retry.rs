//! Retry executor with exponential backoff for transient API failures.

use std::time::Duration;

use tokio::time::sleep;

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that
    pub base_delay: Duration,
    /// Whether HTTP 429 counts as transient for this provider
    pub retry_on_rate_limit: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_on_rate_limit: false,
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base delay
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Treat HTTP 429 as transient
    pub fn retry_on_rate_limit(mut self, retry: bool) -> Self {
        self.retry_on_rate_limit = retry;
        self
    }
}

/// Execute an async operation, retrying transient failures.
///
/// The delay before attempt `n` (n >= 2) is `base_delay * 2^(n-2)`.
/// Non-transient errors propagate immediately after a single attempt;
/// once attempts are exhausted the last error propagates unchanged.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "operation succeeded after retries");
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= config.max_attempts
                    || !error.is_transient(config.retry_on_rate_limit)
                {
                    return Err(error);
                }

                let delay = backoff_delay(config.base_delay, attempt);
                tracing::debug!(
                    attempt,
                    ?delay,
                    error = %error,
                    "transient error, retrying after backoff"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Delay between attempt `n` and attempt `n + 1`.
///
/// Saturates instead of overflowing, so arbitrarily large configured attempt
/// counts degrade into a flat maximum delay.
fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay.saturating_mul(2u32.saturating_pow(attempt - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::time::Instant;

    fn server_error() -> SourceError {
        SourceError::Server {
            source_name: "arXiv",
            status: 503,
        }
    }

    fn client_error() -> SourceError {
        SourceError::Client {
            source_name: "arXiv",
            status: 400,
            message: "Bad Request".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = Rc::new(RefCell::new(0));

        let result = {
            let calls = calls.clone();
            with_retry(RetryConfig::default(), move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_and_total_backoff() {
        let config = RetryConfig::default()
            .max_attempts(4)
            .base_delay(Duration::from_millis(1000));
        let calls = Rc::new(RefCell::new(0u32));

        let started = Instant::now();
        let result: Result<(), SourceError> = {
            let calls = calls.clone();
            with_retry(config, move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    Err(server_error())
                }
            })
        }
        .await;

        assert!(matches!(result, Err(SourceError::Server { .. })));
        assert_eq!(*calls.borrow(), 4);
        // Delays between the 4 attempts: 1s + 2s + 4s.
        assert_eq!(started.elapsed(), Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let config = RetryConfig::default()
            .max_attempts(3)
            .base_delay(Duration::from_millis(10));
        let calls = Rc::new(RefCell::new(0u32));

        let result = {
            let calls = calls.clone();
            with_retry(config, move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    if *calls.borrow() < 3 {
                        Err(server_error())
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn test_backoff_delay_doubles_then_saturates() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(4000));

        // Large attempt counts must not overflow the exponent or the
        // multiplication.
        let huge = backoff_delay(base, 40);
        assert!(huge >= backoff_delay(base, 33));
        assert_eq!(backoff_delay(base, 100), huge);
    }

    #[tokio::test]
    async fn test_non_retryable_is_single_attempt() {
        let config = RetryConfig::default().max_attempts(5);
        let calls = Rc::new(RefCell::new(0u32));

        let result: Result<(), SourceError> = {
            let calls = calls.clone();
            with_retry(config, move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    Err(client_error())
                }
            })
        }
        .await;

        assert!(matches!(result, Err(SourceError::Client { .. })));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retry_is_opt_in() {
        let rate_limited = || SourceError::RateLimited {
            source_name: "Semantic Scholar",
        };

        // Without opt-in, 429 propagates after one attempt.
        let calls = Rc::new(RefCell::new(0u32));
        let config = RetryConfig::default().base_delay(Duration::from_millis(10));
        let result: Result<(), SourceError> = {
            let calls = calls.clone();
            with_retry(config, move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    Err(rate_limited())
                }
            })
        }
        .await;
        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 1);

        // With opt-in, the executor keeps trying.
        let calls = Rc::new(RefCell::new(0u32));
        let config = config.retry_on_rate_limit(true);
        let result: Result<(), SourceError> = {
            let calls = calls.clone();
            with_retry(config, move || {
                let calls = calls.clone();
                async move {
                    *calls.borrow_mut() += 1;
                    Err(rate_limited())
                }
            })
        }
        .await;
        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 3);
    }
}
