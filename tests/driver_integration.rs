//! Integration tests for the chat driver
//!
//! Runs full sends against a scripted provider. Throttle and back-off
//! scenarios use paused tokio time, so minute-long waits finish instantly.

mod common;

use common::{answer, call, rate_limited, tool_turn, ScriptedProvider};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use toolbuddy::agent::{AgentEvent, ChatDriver, DriverConfig, EventBus, LedgerKind, SessionState};
use toolbuddy::errors::AgentError;
use toolbuddy::provider::Role;
use toolbuddy::throttle::TokenEstimator;
use toolbuddy::tools::{ToolContext, ToolRegistry};

fn driver_with(provider: Arc<ScriptedProvider>, dir: &TempDir) -> ChatDriver {
    ChatDriver::new(provider, ToolRegistry::new(), ToolContext::new(dir.path().to_path_buf()))
}

fn drain(receiver: &mut mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_input_budget_blocks_until_oldest_record_expires() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new((0..5).map(|i| answer(&format!("answer {}", i), 5000, 100)).collect())
            .with_latency(Duration::from_secs(2)),
    );
    let (events, mut receiver) = EventBus::new();
    let mut driver = driver_with(provider.clone(), &dir).with_events(events);
    driver.initialize_session().unwrap();

    for _ in 0..4 {
        driver.send("summarize the changes").await.unwrap();
    }
    assert_eq!(driver.usage_report().input_total, 20_000);
    drain(&mut receiver);

    let reply = driver.send("summarize the changes").await.unwrap();
    assert_eq!(reply, "answer 4");

    let calls = provider.calls();
    assert_eq!(calls.len(), 5);
    assert!(calls[3].at - calls[0].at < Duration::from_secs(10));

    // First usage record landed at +2s, so it ages out at +62s
    let gap = calls[4].at - calls[0].at;
    assert!(gap >= Duration::from_secs(62), "fifth call after {:?}", gap);
    assert!(gap < Duration::from_secs(63), "fifth call after {:?}", gap);

    let events = drain(&mut receiver);
    assert!(events.iter().any(|e| matches!(
        e,
        AgentEvent::ThrottleWait {
            ledger: LedgerKind::Input,
            usage: 20_000,
            ..
        }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::ThrottleResumed { ledger: LedgerKind::Input, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_message_estimate_is_reserved_before_send() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("noted", 19_000, 10),
        answer("reviewed", 100, 10),
    ]));
    let (events, mut receiver) = EventBus::new();
    let mut driver = driver_with(provider.clone(), &dir).with_events(events);
    driver.initialize_session().unwrap();

    driver.send("load the codebase").await.unwrap();
    assert_eq!(driver.usage_report().input_total, 19_000);
    drain(&mut receiver);

    // 19,000 is under the 20,000 limit, but not with 2,000 more words on top
    let long_message = vec!["word"; 2_000].join(" ");
    let start = Instant::now();
    driver.send(&long_message).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(60), "waited {:?}", start.elapsed());
    let events = drain(&mut receiver);
    assert!(events.iter().any(|e| matches!(
        e,
        AgentEvent::ThrottleWait {
            ledger: LedgerKind::Input,
            usage: 19_000,
            limit: 18_000,
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_short_message_under_headroom_does_not_wait() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("noted", 19_000, 10),
        answer("ok", 100, 10),
    ]));
    let mut driver = driver_with(provider.clone(), &dir);
    driver.initialize_session().unwrap();

    driver.send("load the codebase").await.unwrap();
    let start = Instant::now();
    driver.send("thanks").await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

/// Charges the same amount for every message
#[derive(Debug)]
struct FlatEstimator(u64);

impl TokenEstimator for FlatEstimator {
    fn estimate(&self, _text: &str) -> u64 {
        self.0
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_estimator_sets_headroom() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("noted", 16_000, 10),
        answer("ok", 100, 10),
    ]));
    let mut driver = driver_with(provider.clone(), &dir).with_estimator(Arc::new(FlatEstimator(5_000)));
    driver.initialize_session().unwrap();

    driver.send("load the codebase").await.unwrap();

    // One word by word count, 5,000 tokens by this estimator
    let start = Instant::now();
    driver.send("hi").await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_usage_report_uses_configured_window() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![answer("ok", 7, 3)]));
    let mut driver = driver_with(provider, &dir).with_config(DriverConfig {
        window: Duration::from_secs(120),
        ..DriverConfig::default()
    });
    driver.initialize_session().unwrap();
    driver.send("hello").await.unwrap();

    let report = driver.usage_report();
    assert_eq!(report.window, Duration::from_secs(120));
    assert_eq!(report.to_string(), "Tokens (last 120s): In: 7, Out: 3, Total: 10");
}

#[tokio::test(start_paused = true)]
async fn test_output_budget_gates_next_send() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("long answer", 100, 3000),
        answer("short", 100, 10),
    ]));
    let mut driver = driver_with(provider.clone(), &dir);
    driver.initialize_session().unwrap();

    let start = Instant::now();
    driver.send("write a long essay").await.unwrap();
    driver.send("and now a short one").await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_same_request_after_backoff() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![rate_limited(), answer("hello", 10, 2)]));
    let (events, mut receiver) = EventBus::new();
    let mut driver = driver_with(provider.clone(), &dir).with_events(events);
    driver.initialize_session().unwrap();

    let start = Instant::now();
    let reply = driver.send("hi").await.unwrap();
    assert_eq!(reply, "hello");

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(70));
    assert!(elapsed < Duration::from_secs(71));

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].messages, calls[1].messages);

    let events = drain(&mut receiver);
    assert!(events.contains(&AgentEvent::RateLimited {
        attempt: 1,
        backoff: Duration::from_secs(70),
    }));

    // Only the successful attempt is charged to the ledgers
    assert_eq!(driver.usage_report().input_total, 10);
    assert_eq!(driver.usage_report().output_total, 2);
}

#[tokio::test]
async fn test_generic_error_rolls_back_and_stays_active() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(AgentError::Provider("HTTP 500: upstream exploded".to_string())),
        answer("recovered", 10, 2),
    ]));
    let mut driver = driver_with(provider.clone(), &dir);
    driver.initialize_session().unwrap();
    let before = driver.conversation().unwrap().len();

    let err = driver.send("first").await.unwrap_err();
    assert!(matches!(err, AgentError::Provider(_)));
    assert_eq!(provider.call_count(), 1);
    assert_eq!(driver.state(), SessionState::Active);
    assert_eq!(driver.conversation().unwrap().len(), before);

    assert_eq!(driver.send("second").await.unwrap(), "recovered");
    let calls = provider.calls();
    assert!(!calls[1].messages.iter().any(|m| m.content == "first"));
}

#[tokio::test]
async fn test_reset_starts_fresh_conversation_and_keeps_usage() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("one", 300, 20),
        answer("two", 40, 5),
    ]));
    let mut driver = driver_with(provider.clone(), &dir).with_instructions(Some("Be brief.".to_string()));
    driver.initialize_session().unwrap();

    driver.send("remember the number 7").await.unwrap();
    let first_id = driver.conversation().unwrap().id();

    driver.reset().unwrap();
    assert_ne!(driver.conversation().unwrap().id(), first_id);
    assert_eq!(driver.usage_report().input_total, 300);

    driver.send("what number?").await.unwrap();

    let calls = provider.calls();
    let second = &calls[1].messages;
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].role, Role::System);
    assert_eq!(second[0].content, "Be brief.");
    assert_eq!(second[1].content, "what number?");
    assert_eq!(calls[0].tools, calls[1].tools);

    let report = driver.usage_report();
    assert_eq!(report.input_total, 340);
    assert_eq!(report.output_total, 25);
    assert_eq!(report.to_string(), "Tokens (last 60s): In: 340, Out: 25, Total: 365");
}

#[tokio::test]
async fn test_lifecycle_guards() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(Vec::new()));
    let mut driver = driver_with(provider.clone(), &dir);

    assert_err!(driver.send("too early").await);
    assert_err!(driver.reset());

    driver.initialize_session().unwrap();
    driver.terminate().unwrap();
    assert_eq!(driver.state(), SessionState::Terminated);

    let err = assert_err!(driver.send("too late").await);
    assert!(matches!(err, AgentError::InvalidTransition { .. }));
    assert_err!(driver.initialize_session());
    assert_ok!(driver.terminate());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_tool_results_are_fed_back() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "ship it friday").unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_turn(
            vec![
                call("call_1", "read_file", json!({"path": "notes.txt"})),
                call("call_2", "launch_rockets", json!({})),
                call("call_3", "read_file", json!({})),
            ],
            50,
            10,
        ),
        answer("The notes say to ship on Friday.", 80, 12),
    ]));
    let mut driver = driver_with(provider.clone(), &dir);
    driver.initialize_session().unwrap();

    let reply = driver.send("what do the notes say?").await.unwrap();
    assert_eq!(reply, "The notes say to ship on Friday.");

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);

    let results: Vec<_> = calls[1].messages.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(results[0].content, "ship it friday");
    assert_eq!(results[1].content, r#"{"error":"Unknown tool: launch_rockets"}"#);
    assert!(results[2].content.starts_with(r#"{"error":"#));

    // Both turns were charged
    assert_eq!(driver.usage_report().input_total, 130);
    assert_eq!(driver.conversation().unwrap().user_turns(), 1);
}

#[tokio::test]
async fn test_tool_round_limit() {
    let dir = TempDir::new().unwrap();
    let looping = (0..4)
        .map(|i| tool_turn(vec![call(&format!("call_{}", i), "list_files", json!({}))], 10, 1))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(looping));
    let mut driver = driver_with(provider.clone(), &dir).with_config(DriverConfig {
        max_tool_rounds: 2,
        ..DriverConfig::default()
    });
    driver.initialize_session().unwrap();
    let before = driver.conversation().unwrap().len();

    let err = driver.send("list forever").await.unwrap_err();
    assert!(err.to_string().contains("Tool call limit of 2 rounds exceeded"));
    assert_eq!(provider.call_count(), 3);
    assert_eq!(driver.conversation().unwrap().len(), before);
    assert_eq!(driver.state(), SessionState::Active);
}
