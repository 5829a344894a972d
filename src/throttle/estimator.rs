//! Outbound message token estimation
//!
//! Estimates reserve throttle headroom before a message is sent; the
//! provider's reported counts are what the ledgers record.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Token estimate for a piece of outbound text
pub trait TokenEstimator: Send + Sync + Debug {
    fn estimate(&self, text: &str) -> u64;
}

/// One token per whitespace-separated word
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountEstimator;

impl TokenEstimator for WordCountEstimator {
    fn estimate(&self, text: &str) -> u64 {
        text.split_whitespace().count() as u64
    }
}

/// Character heuristic: 1 token ≈ `chars_per_token` characters, rounded up
#[derive(Debug, Clone, Copy)]
pub struct CharRatioEstimator {
    chars_per_token: u64,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: u64) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        chars.div_ceil(self.chars_per_token)
    }
}

/// Estimator selection as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    #[default]
    Words,
    Chars,
}

impl EstimatorKind {
    pub fn build(self) -> Arc<dyn TokenEstimator> {
        match self {
            EstimatorKind::Words => Arc::new(WordCountEstimator),
            EstimatorKind::Chars => Arc::new(CharRatioEstimator::default()),
        }
    }
}
