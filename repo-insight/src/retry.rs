// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Retry utilities with exponential backoff and jitter for API calls.
///
/// Only errors classified as transient by [`Error::is_transient`] are retried;
/// definitive errors are returned on the first attempt. A server-provided
/// delay (from `Retry-After`) takes precedence over the computed backoff.
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Error;

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig
{
    /// Maximum number of attempts including the first one (default: 5).
    pub max_attempts:     u32,
    /// Initial delay between retries in milliseconds (default: 1000).
    pub initial_delay_ms: u64,
    /// Multiplier for exponential backoff (default: 2.0).
    pub backoff_factor:   f64,
    /// Upper bound of the random jitter added to each delay (default: 250).
    pub max_jitter_ms:    u64,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_attempts: 5, initial_delay_ms: 1000, backoff_factor: 2.0, max_jitter_ms: 250,
        }
    }
}

impl RetryConfig
{
    /// Backoff delay before retry number `attempt` (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32,) -> Duration
    {
        let exponent = attempt.saturating_sub(1,) as i32;
        let millis = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent,);
        Duration::from_millis(millis.min(u64::MAX as f64,) as u64,)
    }

    fn jitter(&self,) -> Duration
    {
        if self.max_jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=self.max_jitter_ms,),)
    }
}

/// Outcome of a single attempt, carrying an optional server-requested delay.
#[derive(Debug,)]
pub struct AttemptError
{
    /// Error produced by the attempt.
    pub error:       Error,
    /// Delay requested by the server, if any.
    pub retry_after: Option<Duration,>,
}

impl From<Error,> for AttemptError
{
    fn from(error: Error,) -> Self
    {
        Self {
            error, retry_after: None,
        }
    }
}

/// Executes an async operation, retrying transient failures with exponential
/// backoff plus jitter.
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays)
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async function to retry
///
/// # Errors
///
/// Returns a definitive error immediately, or the last transient error once
/// `max_attempts` is exhausted.
///
/// # Example
///
/// ```no_run
/// use repo_insight::{Error, retry::{RetryConfig, retry_with_backoff}};
///
/// # async fn example() -> Result<(), Error> {
/// let config = RetryConfig::default();
/// let value = retry_with_backoff(&config, "fetch data", || async {
///     Ok::<_, repo_insight::retry::AttemptError,>(42,)
/// },)
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T,>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, Error,>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AttemptError,>,>,
{
    let max_attempts = config.max_attempts.max(1,);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(AttemptError {
                error,
                retry_after,
            },) => {
                if !error.is_transient() {
                    return Err(error,);
                }

                if attempt >= max_attempts {
                    warn!("{} failed after {} attempts: {}", operation_name, max_attempts, error);
                    return Err(error,);
                }

                let delay = retry_after.unwrap_or_else(|| config.base_delay(attempt,).saturating_add(config.jitter(),),);
                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}ms...",
                    operation_name,
                    attempt,
                    max_attempts,
                    error,
                    delay.as_millis()
                );

                sleep(delay,).await;
                attempt += 1;
            }
        }
    }
}
