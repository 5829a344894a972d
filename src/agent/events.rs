//! Event bus for driver progress
//!
//! The driver publishes what it is doing (waiting on the throttle, backing
//! off after a rate limit, running tools) so the REPL can render it without
//! the driver knowing about terminals.

use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Which token ledger an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Input,
    Output,
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerKind::Input => write!(f, "input"),
            LedgerKind::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    // Session lifecycle
    SessionInitialized { tools: usize, has_instructions: bool },
    SessionReset,
    SessionTerminated,

    // Throttle
    ThrottleWait {
        ledger: LedgerKind,
        wait: Duration,
        usage: u64,
        limit: u64,
    },
    ThrottleResumed { ledger: LedgerKind, waited: Duration },

    // Provider
    TurnStarted { round: usize },
    RateLimited { attempt: u32, backoff: Duration },
    TurnCompleted {
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
        tool_calls: usize,
    },
    ProviderError { error: String },

    // Tools
    ToolStarted { name: String },
    ToolFinished { name: String, is_error: bool, duration_ms: u64 },
}

/// Bounded channel publisher
#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<AgentEvent>,
}

impl EventBus {
    /// Create new event bus with a 100-event channel
    pub fn new() -> (Self, mpsc::Receiver<AgentEvent>) {
        let (sender, receiver) = mpsc::channel(100);
        (EventBus { sender }, receiver)
    }

    /// Publish without blocking; events are dropped when the channel is
    /// full or nobody is listening
    pub fn emit(&self, event: AgentEvent) {
        let _ = self.sender.try_send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new().0
    }
}
