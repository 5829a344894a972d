//! Chat session driver
//!
//! Owns the single live conversation and coordinates:
//! - Session lifecycle (initialize, reset, terminate)
//! - Throttle gate before every provider turn
//! - Rate-limit retry around every provider call
//! - The tool-call loop, feeding tool outcomes back into the conversation
//! - Token ledgers, extended once per completed turn

use crate::agent::conversation::Conversation;
use crate::agent::events::{AgentEvent, EventBus, LedgerKind};
use crate::agent::state::{SessionEvent, SessionState};
use crate::errors::{AgentError, Result};
use crate::provider::{ChatProvider, Message, ProviderTurn, RetryPolicy};
use crate::throttle::{Capacity, Throttle, TokenEstimator, TokenLedger, UsageReport, WordCountEstimator};
use crate::tools::{invoke, ToolContext, ToolOutcome, ToolRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default per-window input token limit
pub const DEFAULT_INPUT_LIMIT: u64 = 20_000;

/// Default per-window output token limit
pub const DEFAULT_OUTPUT_LIMIT: u64 = 3_000;

/// Default bound on provider turns that request tools within one send
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

/// Driver limits
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub input_limit: u64,
    pub output_limit: u64,
    pub window: Duration,
    pub max_tool_rounds: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            input_limit: DEFAULT_INPUT_LIMIT,
            output_limit: DEFAULT_OUTPUT_LIMIT,
            window: crate::throttle::DEFAULT_WINDOW,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

pub struct ChatDriver {
    provider: Arc<dyn ChatProvider>,
    registry: ToolRegistry,
    tool_ctx: ToolContext,
    instructions: Option<String>,
    config: DriverConfig,
    throttle: Throttle,
    estimator: Arc<dyn TokenEstimator>,
    retry: RetryPolicy,
    events: Option<EventBus>,

    state: SessionState,
    conversation: Option<Conversation>,
    input_ledger: TokenLedger,
    output_ledger: TokenLedger,
}

impl ChatDriver {
    /// Driver with default limits, word-count estimation and a 70s back-off
    pub fn new(provider: Arc<dyn ChatProvider>, registry: ToolRegistry, tool_ctx: ToolContext) -> Self {
        let config = DriverConfig::default();
        Self {
            provider,
            registry,
            tool_ctx,
            instructions: None,
            throttle: Throttle::new(config.window),
            config,
            estimator: Arc::new(WordCountEstimator),
            retry: RetryPolicy::default(),
            events: None,
            state: SessionState::Uninitialized,
            conversation: None,
            input_ledger: TokenLedger::new(),
            output_ledger: TokenLedger::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.throttle = Throttle::new(config.window);
        self.config = config;
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn input_ledger(&self) -> &TokenLedger {
        &self.input_ledger
    }

    pub fn output_ledger(&self) -> &TokenLedger {
        &self.output_ledger
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Build a fresh conversation with every registered tool and the
    /// system instructions. Calling it again replaces the conversation.
    pub fn initialize_session(&mut self) -> Result<()> {
        self.state = self.state.transition(SessionEvent::Initialize)?;
        self.conversation = Some(self.fresh_conversation());

        info!(
            tools = self.registry.len(),
            has_instructions = self.instructions.is_some(),
            "session initialized"
        );
        self.emit(AgentEvent::SessionInitialized {
            tools: self.registry.len(),
            has_instructions: self.instructions.is_some(),
        });
        Ok(())
    }

    /// Discard the conversation and start over. Token ledgers are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.state = self.state.transition(SessionEvent::Reset)?;
        self.conversation = Some(self.fresh_conversation());

        info!("session reset");
        self.emit(AgentEvent::SessionReset);
        Ok(())
    }

    /// End the session; later sends are rejected
    pub fn terminate(&mut self) -> Result<()> {
        self.state = self.state.transition(SessionEvent::Terminate)?;
        self.conversation = None;
        self.emit(AgentEvent::SessionTerminated);
        Ok(())
    }

    /// Token totals over the trailing window
    pub fn usage_report(&self) -> UsageReport {
        let window = self.throttle.window();
        UsageReport {
            input_total: self.input_ledger.usage(window),
            output_total: self.output_ledger.usage(window),
            window,
        }
    }

    /// Deliver an operator message and return the assistant's final answer.
    ///
    /// Waits for input headroom first. On any error the conversation is
    /// rolled back to where it was before the message and the session stays
    /// active.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        self.state = self.state.transition(SessionEvent::Send)?;

        let estimate = self.estimator.estimate(message);
        let headroom = self.config.input_limit.saturating_sub(estimate);
        self.wait_for_capacity(LedgerKind::Input, headroom).await;
        self.wait_for_capacity(LedgerKind::Output, self.config.output_limit).await;

        let checkpoint = {
            let conversation = self.conversation_mut()?;
            let len = conversation.len();
            conversation.push(Message::user(message));
            len
        };

        match self.run_turns().await {
            Ok(content) => Ok(content),
            Err(err) => {
                if let Some(conversation) = self.conversation.as_mut() {
                    conversation.truncate(checkpoint);
                }
                warn!(error = %err, "send failed, conversation rolled back");
                self.emit(AgentEvent::ProviderError { error: err.to_string() });
                Err(err)
            }
        }
    }

    /// Provider turns until one answers without tool calls
    async fn run_turns(&mut self) -> Result<String> {
        let mut tool_rounds = 0;

        loop {
            self.emit(AgentEvent::TurnStarted { round: tool_rounds });
            let turn = self.complete_turn().await?;

            if !turn.wants_tools() {
                let content = turn.content.unwrap_or_default();
                self.conversation_mut()?
                    .push(Message::assistant(content.clone(), Vec::new()));
                return Ok(content);
            }

            tool_rounds += 1;
            if tool_rounds > self.config.max_tool_rounds {
                return Err(AgentError::Generic(format!(
                    "Tool call limit of {} rounds exceeded",
                    self.config.max_tool_rounds
                )));
            }

            let ProviderTurn {
                content, tool_calls, ..
            } = turn;
            self.conversation_mut()?
                .push(Message::assistant(content.unwrap_or_default(), tool_calls.clone()));

            for call in tool_calls {
                let outcome = self.run_tool(&call.name, &call.arguments).await;
                self.conversation_mut()?
                    .push(Message::tool_result(call.id, outcome.to_message_content()));
            }

            self.wait_for_capacity(LedgerKind::Input, self.config.input_limit).await;
            self.wait_for_capacity(LedgerKind::Output, self.config.output_limit).await;
        }
    }

    /// One provider call under the retry policy, recorded in the ledgers
    async fn complete_turn(&mut self) -> Result<ProviderTurn> {
        let request = self.conversation_mut()?.request();
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();

        let attempted = self
            .retry
            .run(
                || provider.complete(&request),
                |attempt, backoff| {
                    if let Some(events) = &events {
                        events.emit(AgentEvent::RateLimited { attempt, backoff });
                    }
                },
            )
            .await;
        let turn = attempted.result?;

        if let Some(tokens) = turn.input_tokens {
            self.input_ledger.record(tokens);
        }
        if let Some(tokens) = turn.output_tokens {
            self.output_ledger.record(tokens);
        }

        debug!(
            input_tokens = ?turn.input_tokens,
            output_tokens = ?turn.output_tokens,
            tool_calls = turn.tool_calls.len(),
            attempts = attempted.stats.attempts,
            "provider turn completed"
        );
        self.emit(AgentEvent::TurnCompleted {
            input_tokens: turn.input_tokens,
            output_tokens: turn.output_tokens,
            tool_calls: turn.tool_calls.len(),
        });

        Ok(turn)
    }

    async fn run_tool(&self, name: &str, arguments: &serde_json::Value) -> ToolOutcome {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = %name, "provider requested unknown tool");
            return ToolOutcome::error(AgentError::UnknownTool(name.to_string()).to_string());
        };

        self.emit(AgentEvent::ToolStarted { name: name.to_string() });
        let start = StdInstant::now();
        let outcome = invoke(tool.as_ref(), arguments, &self.tool_ctx).await;
        self.emit(AgentEvent::ToolFinished {
            name: name.to_string(),
            is_error: outcome.is_error(),
            duration_ms: start.elapsed().as_millis() as u64,
        });

        outcome
    }

    /// Block until the ledger's windowed usage is below `limit`
    async fn wait_for_capacity(&self, kind: LedgerKind, limit: u64) {
        let ledger = match kind {
            LedgerKind::Input => &self.input_ledger,
            LedgerKind::Output => &self.output_ledger,
        };

        if let Capacity::WaitFor(wait) = self.throttle.check(ledger.records(), limit, Instant::now()) {
            let usage = ledger.usage(self.throttle.window());
            info!(ledger = %kind, usage, limit, wait_ms = wait.as_millis() as u64, "throttling");
            self.emit(AgentEvent::ThrottleWait {
                ledger: kind,
                wait,
                usage,
                limit,
            });

            let waited = self.throttle.await_capacity(ledger, limit).await;
            self.emit(AgentEvent::ThrottleResumed { ledger: kind, waited });
        }
    }

    fn fresh_conversation(&self) -> Conversation {
        Conversation::new(self.registry.specs(), self.instructions.clone())
    }

    fn conversation_mut(&mut self) -> Result<&mut Conversation> {
        let state = self.state;
        self.conversation.as_mut().ok_or_else(|| AgentError::InvalidTransition {
            from: format!("{:?}", state),
            event: "Send".to_string(),
            reason: "no conversation has been initialized".to_string(),
        })
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}
