//! toolbuddy - Terminal Chat Agent
//!
//! Drives a tool-calling conversation against an OpenAI-compatible chat
//! endpoint while keeping token usage under per-minute budgets.
//!
//! # Architecture
//!
//! - **tools**: namespaced tool declarations, the invoke contract, shell helper
//! - **throttle**: sliding-window token ledgers and capacity checks
//! - **provider**: chat provider boundary and rate-limit retry
//! - **agent**: session state machine and the chat driver
//! - **repl**: interactive front end

pub mod agent;
pub mod cli;
pub mod config;
pub mod errors;
pub mod provider;
pub mod repl;
pub mod throttle;
pub mod tools;
pub mod workspace;

// Re-export commonly used types
pub use agent::{ChatDriver, SessionState};
pub use errors::{AgentError, Result};
pub use throttle::UsageReport;
pub use tools::{ToolRegistry, ToolOutcome};
