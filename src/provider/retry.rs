//! Rate-limit retry policy
//!
//! A provider call that fails with `RateLimited` is retried with the exact
//! same request after a fixed back-off. Every other error is returned on
//! the first occurrence. Attempts are unbounded unless `max_attempts` is set.

use crate::errors::{AgentError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Default pause after a rate-limit response
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(70);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Duration,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF, None)
    }
}

/// What happened across the attempts of one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    /// Provider calls made, including the final one
    pub attempts: u32,
    /// Rate-limit responses absorbed
    pub rate_limits: u32,
    /// Total time spent backing off
    pub backoff: Duration,
}

/// Result of a call together with its retry statistics
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub stats: RetryStats,
}

impl RetryPolicy {
    pub fn new(backoff: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            backoff,
            max_attempts: max_attempts.map(|n| n.max(1)),
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Run `operation`, sleeping and retrying on rate limits.
    ///
    /// `on_backoff` is told the attempt number and the pause before each
    /// sleep. When `max_attempts` is exhausted the last `RateLimited` error
    /// is returned.
    pub async fn run<F, Fut, T>(&self, mut operation: F, mut on_backoff: impl FnMut(u32, Duration)) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut stats = RetryStats::default();

        loop {
            stats.attempts += 1;

            match operation().await {
                Err(AgentError::RateLimited) => {
                    stats.rate_limits += 1;

                    if self.max_attempts.is_some_and(|max| stats.attempts >= max) {
                        warn!(attempts = stats.attempts, "rate limit retries exhausted");
                        return Attempted {
                            result: Err(AgentError::RateLimited),
                            stats,
                        };
                    }

                    warn!(
                        attempt = stats.attempts,
                        backoff_secs = self.backoff.as_secs(),
                        "rate limit hit, backing off"
                    );
                    on_backoff(stats.attempts, self.backoff);
                    sleep(self.backoff).await;
                    stats.backoff += self.backoff;
                }
                result => return Attempted { result, stats },
            }
        }
    }
}
