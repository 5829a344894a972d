//! Tool invocation wrapper
//!
//! Every tool call goes through [`invoke`], which never fails: returned
//! errors and panics alike become `{error: message}`.

use crate::tools::types::{Tool, ToolContext, ToolOutcome};
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, warn};

/// Execute a tool, capturing every failure as a structured outcome
pub async fn invoke(tool: &dyn Tool, args: &Value, ctx: &ToolContext) -> ToolOutcome {
    let name = tool.spec().name;
    let start = Instant::now();

    let outcome = match AssertUnwindSafe(tool.execute(args, ctx)).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            warn!(tool = %name, error = %err, "tool failed");
            ToolOutcome::error(err.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(tool = %name, error = %message, "tool panicked");
            ToolOutcome::error(message)
        }
    };

    debug!(
        tool = %name,
        duration_ms = start.elapsed().as_millis() as u64,
        is_error = outcome.is_error(),
        "tool finished"
    );
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
