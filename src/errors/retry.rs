use std::future::Future;
use std::time::Duration;

use super::classification::ErrorClassification;
use super::types::{PentoscanError, ScanError};
use tracing::{debug, warn};

/// Errors that can say whether another attempt makes sense.
pub trait Retryable {
    fn classification(&self) -> ErrorClassification;
}

impl Retryable for ScanError {
    fn classification(&self) -> ErrorClassification {
        self.classify()
    }
}

impl Retryable for PentoscanError {
    fn classification(&self) -> ErrorClassification {
        self.classify()
    }
}

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Caller-side retry policy. The request executor never retries on its own;
/// the default here is no retries either.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff `base * 2^attempt` plus up to one `base` of jitter,
    /// capped at 30s.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let factor = 2.0_f64.powi(attempt.min(16) as i32);
        let jitter: f64 = rand::random::<f64>() * base;
        Duration::from_secs_f64(base * factor + jitter).min(MAX_DELAY)
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and we haven't
/// exceeded max_retries.
pub async fn with_retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classification();

                if !classification.retryable || attempt + 1 >= max_attempts {
                    if !classification.retryable {
                        debug!(
                            operation = operation_name,
                            error_type = classification.error_type,
                            "Non-retryable error, failing immediately"
                        );
                    } else if max_attempts > 1 {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = config.retry_delay(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    error_type = classification.error_type,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after error"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
