//! Operator prompt tool
//!
//! Lets the model ask the operator a question mid-turn. The answer is read
//! from stdin on a blocking thread.

use crate::errors::{AgentError, Result};
use crate::tools::registry::ToolNamespace;
use crate::tools::types::{optional_str, required_str, Tool, ToolContext, ToolOutcome, ToolSpec};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

pub fn namespace() -> ToolNamespace {
    ToolNamespace::new("user_input").tool(RequestUserInput::stdin())
}

#[derive(Clone)]
enum InputSource {
    Stdin,
    /// Canned answers, consumed in order
    Scripted(Arc<Mutex<VecDeque<String>>>),
}

#[derive(Clone)]
pub struct RequestUserInput {
    source: InputSource,
}

impl RequestUserInput {
    pub fn stdin() -> Self {
        Self {
            source: InputSource::Stdin,
        }
    }

    /// Answer prompts from a fixed list instead of the terminal
    pub fn scripted<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: InputSource::Scripted(Arc::new(Mutex::new(answers.into_iter().map(Into::into).collect()))),
        }
    }

    async fn read_answer(&self, prompt: String) -> Result<String> {
        match &self.source {
            InputSource::Stdin => tokio::task::spawn_blocking(move || read_line(&prompt))
                .await
                .map_err(|e| AgentError::ToolExecution(format!("Input task failed: {}", e)))?,
            InputSource::Scripted(answers) => answers
                .lock()
                .map_err(|_| AgentError::ToolExecution("Input source poisoned".to_string()))?
                .pop_front()
                .ok_or_else(|| AgentError::ToolExecution("No input available".to_string())),
        }
    }
}

fn read_line(prompt: &str) -> Result<String> {
    let mut stdout = io::stdout();
    writeln!(stdout, "\n{}", prompt)?;
    write!(stdout, "> ")?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(AgentError::ToolExecution("Input stream closed".to_string()));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[async_trait]
impl Tool for RequestUserInput {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "request_user_input",
            "Request input from the user. Use this when you need a decision or information only the user can provide.",
        )
        .param("prompt", "The prompt to show to the user")
        .optional("default", "Answer to use when the user enters nothing", None)
    }

    async fn execute(&self, args: &Value, _ctx: &ToolContext) -> Result<ToolOutcome> {
        let prompt = required_str(args, "prompt")?;
        let answer = self.read_answer(prompt.to_string()).await?;

        match optional_str(args, "default") {
            Some(default) if answer.trim().is_empty() => Ok(ToolOutcome::success(default)),
            _ => Ok(ToolOutcome::success(answer)),
        }
    }
}
