//! Shared test fixtures: a scripted chat provider

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use toolbuddy::errors::{AgentError, Result};
use toolbuddy::provider::{ChatProvider, ChatRequest, Message, ProviderTurn, ToolCall};

/// One provider call as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

/// Provider that replays scripted turns and records every request.
///
/// Each call takes `latency` of (possibly paused) tokio time. When the
/// script runs out, calls answer with `"done"`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderTurn>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Duration,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderTurn>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ProviderTurn> {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now(),
            messages: request.messages.clone(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ProviderTurn::text("done")))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn answer(text: &str, input: u64, output: u64) -> Result<ProviderTurn> {
    Ok(ProviderTurn::text(text).with_usage(input, output))
}

pub fn tool_turn(calls: Vec<ToolCall>, input: u64, output: u64) -> Result<ProviderTurn> {
    Ok(ProviderTurn {
        content: None,
        tool_calls: calls,
        input_tokens: Some(input),
        output_tokens: Some(output),
    })
}

pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub fn rate_limited() -> Result<ProviderTurn> {
    Err(AgentError::RateLimited)
}
