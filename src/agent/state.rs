//! Session lifecycle state machine
//!
//! Valid transitions:
//! 1. Uninitialized → Active      (on: Initialize)
//! 2. Active        → Active      (on: Initialize | Reset | Send)
//! 3. Active        → Terminated  (on: Terminate)
//! 4. Uninitialized → Terminated  (on: Terminate)
//! 5. Terminated    → Terminated  (on: Terminate)
//!
//! Everything else, including any event after termination other than
//! `Terminate`, is rejected.

use crate::errors::{AgentError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No conversation exists yet
    Uninitialized,

    /// A conversation is live and accepts messages
    Active,

    /// Operator ended the session (terminal)
    Terminated,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Build a fresh conversation
    Initialize,

    /// Discard the conversation and build a new one
    Reset,

    /// Deliver an operator message
    Send,

    /// End the session
    Terminate,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }

    /// Attempt a transition
    pub fn transition(&self, event: SessionEvent) -> Result<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        let next = match (self, event) {
            (Uninitialized, Initialize) => Active,
            (Active, Initialize | Reset | Send) => Active,
            (Uninitialized | Active | Terminated, Terminate) => Terminated,

            (Uninitialized, Reset | Send) => {
                return Err(self.rejected(event, "no conversation has been initialized"))
            }
            (Terminated, _) => return Err(self.rejected(event, "session has ended")),
        };

        Ok(next)
    }

    /// Events accepted from this state
    pub fn valid_events(&self) -> Vec<SessionEvent> {
        use SessionEvent::*;

        match self {
            SessionState::Uninitialized => vec![Initialize, Terminate],
            SessionState::Active => vec![Initialize, Reset, Send, Terminate],
            SessionState::Terminated => vec![Terminate],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "Not started",
            SessionState::Active => "Active",
            SessionState::Terminated => "Ended",
        }
    }

    fn rejected(&self, event: SessionEvent, reason: &str) -> AgentError {
        AgentError::InvalidTransition {
            from: format!("{:?}", self),
            event: format!("{:?}", event),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use SessionEvent::*;
        use SessionState::*;

        assert_eq!(Uninitialized.transition(Initialize).unwrap(), Active);
        assert_eq!(Active.transition(Initialize).unwrap(), Active);
        assert_eq!(Active.transition(Reset).unwrap(), Active);
        assert_eq!(Active.transition(Send).unwrap(), Active);
        assert_eq!(Active.transition(Terminate).unwrap(), Terminated);
        assert_eq!(Uninitialized.transition(Terminate).unwrap(), Terminated);
        assert_eq!(Terminated.transition(Terminate).unwrap(), Terminated);
    }

    #[test]
    fn test_invalid_transitions() {
        use SessionEvent::*;
        use SessionState::*;

        assert!(Uninitialized.transition(Send).is_err());
        assert!(Uninitialized.transition(Reset).is_err());
        assert!(Terminated.transition(Send).is_err());
        assert!(Terminated.transition(Reset).is_err());
        assert!(Terminated.transition(Initialize).is_err());
    }

    #[test]
    fn test_valid_events_agree_with_transition() {
        let all = [
            SessionEvent::Initialize,
            SessionEvent::Reset,
            SessionEvent::Send,
            SessionEvent::Terminate,
        ];

        for state in [SessionState::Uninitialized, SessionState::Active, SessionState::Terminated] {
            let valid = state.valid_events();
            for event in all {
                assert_eq!(
                    state.transition(event).is_ok(),
                    valid.contains(&event),
                    "{:?} on {:?}",
                    state,
                    event
                );
            }
        }
    }

    #[test]
    fn test_terminal_state() {
        assert!(SessionState::Terminated.is_terminal());
        assert!(!SessionState::Active.is_terminal());
        assert!(!SessionState::Uninitialized.is_terminal());
    }

    #[test]
    fn test_rejection_message() {
        let err = SessionState::Terminated.transition(SessionEvent::Send).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from Terminated via Send: session has ended"
        );
    }
}
