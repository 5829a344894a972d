//! Error types for toolbuddy
//!
//! One enum covers the whole runtime. Tool failures are converted into
//! structured tool outcomes before they reach the provider, rate limits are
//! absorbed by the retry policy, and everything else surfaces to the operator.

use thiserror::Error;

/// Main error type for the agent runtime
#[derive(Error, Debug)]
pub enum AgentError {
    /// Session state machine errors
    #[error("Invalid state transition from {from} via {event}: {reason}")]
    InvalidTransition {
        from: String,
        event: String,
        reason: String,
    },

    /// Provider signalled that request volume exceeded its limits
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Any other provider failure (bad status, malformed body, ...)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Failure raised inside a tool's own logic
    #[error("{0}")]
    ToolExecution(String),

    /// Tool called with missing or malformed arguments
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Provider asked for a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("Agent error: {0}")]
    Generic(String),
}

impl AgentError {
    /// Shorthand for a missing required tool argument
    pub fn missing_argument(name: &str) -> Self {
        AgentError::InvalidArgument {
            name: name.to_string(),
            reason: "required argument is missing".to_string(),
        }
    }

    /// Whether the retry policy should absorb this error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AgentError::RateLimited)
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Convert anyhow errors to AgentError
impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = AgentError::InvalidTransition {
            from: "Terminated".to_string(),
            event: "Send".to_string(),
            reason: "session has ended".to_string(),
        };
        assert!(err.to_string().contains("Terminated"));
        assert!(err.to_string().contains("Send"));
    }

    #[test]
    fn test_tool_execution_message_is_verbatim() {
        let err = AgentError::ToolExecution("disk full".to_string());
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_rate_limit_classification() {
        assert!(AgentError::RateLimited.is_rate_limit());
        assert!(!AgentError::Provider("HTTP 500".to_string()).is_rate_limit());
    }

    #[test]
    fn test_missing_argument() {
        let err = AgentError::missing_argument("path");
        assert_eq!(err.to_string(), "Invalid argument 'path': required argument is missing");
    }
}
