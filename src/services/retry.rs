//! Retry Logic with Exponential Backoff
//!
//! Only retries errors that classify themselves as retryable through [`Retryable`].

use crate::config::ScraperConfig;
use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Errors that know whether another attempt can succeed
pub trait Retryable: Display {
    fn is_retryable(&self) -> bool;

    /// Multiplier on the backoff delay for this failure
    fn backoff_multiplier(&self) -> f64 {
        1.0
    }

    /// Server-requested wait, honoured when longer than the backoff
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 5000,
            max_delay_ms: 120_000,
            backoff_factor: 2.0,
        }
    }
}

impl From<&ScraperConfig> for RetryConfig {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay_ms: config.retry_delay_ms,
            max_delay_ms: RetryConfig::default().max_delay_ms,
            backoff_factor: config.backoff_factor,
        }
    }
}

/// Execute an async closure with retry logic.
///
/// Stops at the first non-retryable error or once `max_retries` retries are spent.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation_name: &str, mut f: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;

                if !err.is_retryable() || attempt > config.max_retries {
                    if attempt > config.max_retries {
                        warn!(
                            "[Retry] {} failed after {} attempts: {}",
                            operation_name, attempt, err
                        );
                    }
                    return Err(err);
                }

                let mut wait = Duration::from_millis(
                    ((delay_ms as f64 * err.backoff_multiplier()) as u64).min(config.max_delay_ms),
                );
                if let Some(requested) = err.retry_after() {
                    wait = wait.max(requested);
                }

                debug!(
                    "[Retry] {} attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, attempt, config.max_retries, err, wait
                );

                sleep(wait).await;

                delay_ms = ((delay_ms as f64 * config.backoff_factor) as u64).min(config.max_delay_ms);
            }
        }
    }
}
