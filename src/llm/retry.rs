//! Bounded retry with randomized exponential backoff
//!
//! After the n-th failure the wrapper sleeps a uniform random duration in
//! `[0, min(max_wait, multiplier * 2^(n-1))]`. When every attempt fails the
//! last error is handed back untouched in `Err`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::core::config::AgentConfig;

/// Retry policy for outbound completion calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub multiplier: Duration,
    /// Cap on any single wait
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            max_wait: Duration::from_secs(40),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            multiplier: Duration::from_millis(config.retry_multiplier_ms),
            max_wait: Duration::from_millis(config.retry_max_wait_ms),
        }
    }

    /// A policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Upper bound of the wait after `failures` failed attempts
    pub fn wait_ceiling(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        let ceiling = self.multiplier.saturating_mul(1u32 << exponent);
        ceiling.min(self.max_wait)
    }

    /// Randomized wait after `failures` failed attempts
    pub fn backoff(&self, failures: u32) -> Duration {
        let ceiling = self.wait_ceiling(failures).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling))
    }

    /// Run `op` until it succeeds or the attempts are used up
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut failures = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    failures += 1;
                    if failures >= self.max_attempts {
                        tracing::error!(
                            "{} failed after {} attempts: {}",
                            label,
                            failures,
                            e
                        );
                        return Err(e);
                    }

                    let wait = self.backoff(failures);
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        label,
                        failures,
                        self.max_attempts,
                        wait,
                        e
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
