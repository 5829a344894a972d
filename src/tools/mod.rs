//! Tool system
//!
//! - Namespaced tool declarations flattened into a registry
//! - Invocation wrapper that turns every failure into `{error}`
//! - Shell command helper shaping `{command, result|error}`
//! - Working-directory guard for file access

pub mod command;
pub mod implementations;
pub mod invoke;
pub mod registry;
pub mod security;
pub mod types;

pub use command::run_external_command;
pub use invoke::invoke;
pub use registry::{ToolNamespace, ToolRegistry};
pub use security::WorkspaceGuard;
pub use types::{Tool, ToolContext, ToolOutcome, ToolSpec};
