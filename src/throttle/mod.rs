//! Token-budget throttle over a sliding window
//!
//! Usage is the sum of ledger records younger than the window. A caller
//! asking for capacity under a limit is told either that capacity is
//! available now, how long until enough records age out, or that no amount
//! of waiting will help (the window is already empty).

pub mod estimator;
pub mod ledger;

pub use estimator::{CharRatioEstimator, EstimatorKind, TokenEstimator, WordCountEstimator};
pub use ledger::{usage_in_window, TokenLedger, UsageRecord, DEFAULT_WINDOW};

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Result of a capacity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Usage is below the limit
    Available,
    /// Usage drops below the limit after this long
    WaitFor(Duration),
    /// Window is empty yet the limit is still not satisfied
    Unreachable,
}

/// Trailing-window token totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub input_total: u64,
    pub output_total: u64,
    /// Window the totals were taken over
    pub window: Duration,
}

impl Default for UsageReport {
    fn default() -> Self {
        Self {
            input_total: 0,
            output_total: 0,
            window: DEFAULT_WINDOW,
        }
    }
}

impl UsageReport {
    pub fn total(&self) -> u64 {
        self.input_total + self.output_total
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tokens (last {}s): In: {}, Out: {}, Total: {}",
            self.window.as_secs(),
            self.input_total,
            self.output_total,
            self.total()
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    window: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Windowed usage at `now`
    pub fn usage_at(&self, records: &[UsageRecord], now: Instant) -> u64 {
        usage_in_window(records, now, self.window)
    }

    /// Decide whether usage at `now` is below `limit`, and if not, how long
    /// until it will be.
    ///
    /// Records leave the window oldest first, so the wait is the expiry of
    /// the first record whose removal brings usage under the limit. When no
    /// removal suffices (limit of zero) the wait runs until the window
    /// drains, after which the check reports `Unreachable`.
    pub fn check(&self, records: &[UsageRecord], limit: u64, now: Instant) -> Capacity {
        let mut live: Vec<&UsageRecord> = records.iter().filter(|r| r.in_window(now, self.window)).collect();
        let mut usage: u64 = live.iter().map(|r| r.tokens).sum();

        if usage < limit {
            return Capacity::Available;
        }

        live.sort_by_key(|r| r.at);
        let Some(last) = live.last().map(|r| r.expires_at(self.window)) else {
            return Capacity::Unreachable;
        };

        for record in &live {
            usage -= record.tokens;
            if usage < limit {
                return Capacity::WaitFor(record.expires_at(self.window).saturating_duration_since(now));
            }
        }

        Capacity::WaitFor(last.saturating_duration_since(now))
    }

    /// Sleep until usage is below `limit`. Returns the total time waited.
    ///
    /// Returns immediately when the window holds no records, since waiting
    /// could never free capacity.
    pub async fn await_capacity(&self, ledger: &TokenLedger, limit: u64) -> Duration {
        let start = Instant::now();

        loop {
            match self.check(ledger.records(), limit, Instant::now()) {
                Capacity::Available | Capacity::Unreachable => break,
                Capacity::WaitFor(wait) => {
                    debug!(
                        limit,
                        usage = ledger.usage(self.window),
                        wait_ms = wait.as_millis() as u64,
                        "throttle waiting"
                    );
                    sleep(wait).await;
                }
            }
        }

        start.elapsed()
    }
}
