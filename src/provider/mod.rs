//! Chat provider boundary
//!
//! The driver talks to the remote model only through [`ChatProvider`]. A
//! provider returns one [`ProviderTurn`] per request and reports rate
//! limiting as [`AgentError::RateLimited`](crate::errors::AgentError) so the
//! retry policy can tell it apart from other failures.

pub mod openai;
pub mod retry;

pub use openai::OpenAiClient;
pub use retry::{Attempted, RetryPolicy, RetryStats};

use crate::errors::Result;
use crate::tools::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

/// Everything the provider needs for one completion
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

/// One completed provider turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Prompt tokens, when the provider reports them
    pub input_tokens: Option<u64>,
    /// Completion tokens, when the provider reports them
    pub output_tokens: Option<u64>,
}

impl ProviderTurn {
    /// Final text answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, input: u64, output: u64) -> Self {
        self.input_tokens = Some(input);
        self.output_tokens = Some(output);
        self
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion. Rate limiting must surface as `RateLimited`.
    async fn complete(&self, request: &ChatRequest) -> Result<ProviderTurn>;

    /// Model identifier, for display
    fn model(&self) -> &str;
}
