//! Exponential-backoff retry for transient provider errors.

use std::future::Future;
use std::time::Duration;

use crate::error::ModelError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_multiplier: f64,
    /// Whether to add up to 25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Execute an async operation with exponential backoff retry on transient errors.
///
/// Retries on errors where [`ModelError::is_transient`] is true, honoring the
/// server's retry-after for rate limits. Permanent errors (auth, parse, API
/// rejection) return immediately.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, ModelError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut last_err = None;
    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_transient() || attempt == config.max_retries {
                    return Err(e);
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms,
                    error = %e,
                    "retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| ModelError::Connection {
        message: "all retry attempts exhausted".to_string(),
    }))
}

/// Compute backoff delay, respecting rate limit retry-after headers.
fn compute_backoff(config: &RetryConfig, attempt: u32, err: &ModelError) -> u64 {
    if let ModelError::RateLimited { retry_after_secs } = err {
        let server_ms = retry_after_secs * 1000;
        let computed = compute_exponential_backoff(config, attempt);
        return server_ms.max(computed);
    }
    compute_exponential_backoff(config, attempt)
}

/// Pure exponential backoff with optional jitter.
fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    let capped = base.min(config.max_backoff_ms as f64) as u64;
    if config.jitter {
        let jitter = (capped as f64 * 0.25 * rand_simple()) as u64;
        capped + jitter
    } else {
        capped
    }
}

/// Simple deterministic pseudo-random for jitter (avoids pulling in rand crate).
fn rand_simple() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&fast_config(), || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ModelError::Connection { message: "refused".into() })
            } else {
                Ok(42u32)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_error_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(&fast_config(), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Auth { provider: "openai".into() })
        })
        .await;
        assert!(matches!(result, Err(ModelError::Auth { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(&fast_config(), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Timeout { message: "slow".into() })
        })
        .await;
        assert!(matches!(result, Err(ModelError::Timeout { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn backoff_respects_retry_after() {
        let config = fast_config();
        let err = ModelError::RateLimited { retry_after_secs: 2 };
        assert_eq!(compute_backoff(&config, 0, &err), 2000);
    }

    #[test]
    fn backoff_is_capped() {
        let config = fast_config();
        let err = ModelError::Connection { message: "refused".into() };
        assert_eq!(compute_backoff(&config, 10, &err), 4);
    }
}
