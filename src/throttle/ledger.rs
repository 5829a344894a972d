//! Token usage ledger
//!
//! Append-only record of `(timestamp, tokens)` pairs. Entries are never
//! pruned; windowed sums filter by age at read time.

use std::time::Duration;
use tokio::time::Instant;

/// Default sliding window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// One completed provider turn's token count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    pub at: Instant,
    pub tokens: u64,
}

impl UsageRecord {
    /// Whether this record still counts at `now`.
    ///
    /// A record exactly `window` old has left the window. Records stamped
    /// after `now` count as in-window.
    pub fn in_window(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.at) < window
    }

    /// Instant at which this record leaves the window
    pub fn expires_at(&self, window: Duration) -> Instant {
        self.at + window
    }
}

/// Append-only usage sequence for one direction (input or output)
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    records: Vec<UsageRecord>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record stamped with the current time
    pub fn record(&mut self, tokens: u64) {
        self.record_at(Instant::now(), tokens);
    }

    pub fn record_at(&mut self, at: Instant, tokens: u64) {
        self.records.push(UsageRecord { at, tokens });
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum over the trailing window ending now
    pub fn usage(&self, window: Duration) -> u64 {
        usage_in_window(&self.records, Instant::now(), window)
    }

    /// Sum over every record ever appended
    pub fn lifetime_total(&self) -> u64 {
        self.records.iter().map(|r| r.tokens).sum()
    }
}

/// Sum of token counts whose timestamps fall inside `(now - window, now]`
pub fn usage_in_window(records: &[UsageRecord], now: Instant, window: Duration) -> u64 {
    records
        .iter()
        .filter(|r| r.in_window(now, window))
        .map(|r| r.tokens)
        .sum()
}
