//! OpenAI-compatible chat completions client
//!
//! Speaks `POST {base_url}/chat/completions` with function tools. A local
//! Ollama server exposes the same API under `/v1`, which is the default.

use crate::errors::{AgentError, Result};
use crate::provider::{ChatProvider, ChatRequest, Message, ProviderTurn, Role, ToolCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default endpoint (Ollama's OpenAI-compatible API)
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_MODEL, None, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_config(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AgentError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request body for a completion
    fn build_body(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_wire).collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|spec| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": spec.name,
                            "description": spec.description,
                            "parameters": spec.json_schema(),
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }

        body
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ProviderTurn> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).json(&self.build_body(request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(url = %url, "provider rate limited the request");
            return Err(AgentError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Provider(format!("HTTP {}: {}", status, error_text)));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse response: {}", e)))?;

        let turn = body.into_turn()?;
        debug!(
            model = %self.model,
            input_tokens = ?turn.input_tokens,
            output_tokens = ?turn.output_tokens,
            tool_calls = turn.tool_calls.len(),
            "completion received"
        );
        Ok(turn)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn message_to_wire(message: &Message) -> Value {
    match message.role {
        Role::Assistant if !message.tool_calls.is_empty() => {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            let content = if message.content.is_empty() {
                Value::Null
            } else {
                Value::String(message.content.clone())
            };
            json!({"role": "assistant", "content": content, "tool_calls": calls})
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content,
        }),
        role => json!({"role": role, "content": message.content}),
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    /// Usually a JSON-encoded string; some servers send an object
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

impl CompletionResponse {
    fn into_turn(self) -> Result<ProviderTurn> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("Response contained no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple())),
                arguments: decode_arguments(&call.function.name, call.function.arguments),
                name: call.function.name,
            })
            .collect();

        Ok(ProviderTurn {
            content: choice.message.content,
            tool_calls,
            input_tokens: self.usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: self.usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}

fn decode_arguments(tool: &str, raw: Value) -> Value {
    match raw {
        Value::String(s) if s.trim().is_empty() => json!({}),
        Value::String(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!(tool = %tool, error = %e, "tool arguments are not valid JSON");
            json!({})
        }),
        Value::Null => json!({}),
        other => other,
    }
}
