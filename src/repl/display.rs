//! Display manager for the REPL
//!
//! Colored status lines and a spinner while the agent is thinking, running
//! a tool, or waiting on the throttle or a rate-limit back-off.

use crate::agent::AgentEvent;
use crate::cli::Verbosity;
use crate::repl::commands::DIRECTIVES;
use crate::throttle::UsageReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Tools that read from the terminal; no spinner may run over them
const INTERACTIVE_TOOLS: &[&str] = &["request_user_input"];

pub struct DisplayManager {
    verbosity: Verbosity,
    current_bar: Option<ProgressBar>,
    update_interval: Duration,
}

impl DisplayManager {
    pub fn new(verbosity: Verbosity) -> Self {
        DisplayManager {
            verbosity,
            current_bar: None,
            update_interval: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, working_dir: &Path, tools: usize) {
        if !self.verbosity.show_progress() {
            return;
        }

        let width = 64;
        println!("\n{}", "=".repeat(width).cyan());
        println!("{}", format!("  toolbuddy {}", version).bold().cyan());
        println!(
            "{}",
            format!("  Model: {} | Tools: {}", model, tools).dimmed()
        );
        println!("{}", format!("  Working in directory: {}", working_dir.display()).dimmed());
        println!("{}\n", "=".repeat(width).cyan());
        println!(
            "Chat with the agent. Type {} for directives, {} to quit\n",
            "help".green(),
            "exit".green()
        );
    }

    /// Render one driver event
    pub fn handle_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::TurnStarted { .. } => self.start_spinner("Thinking...".to_string()),
            AgentEvent::TurnCompleted {
                input_tokens,
                output_tokens,
                ..
            } => {
                self.finish_current();
                if self.verbosity.show_events() {
                    self.show_debug(&format!(
                        "turn: {} in / {} out",
                        input_tokens.map_or("?".to_string(), |n| n.to_string()),
                        output_tokens.map_or("?".to_string(), |n| n.to_string())
                    ));
                }
            }
            AgentEvent::ToolStarted { name } => {
                if INTERACTIVE_TOOLS.contains(&name.as_str()) {
                    self.finish_current();
                } else {
                    self.start_spinner(format!("Running {}...", name));
                }
            }
            AgentEvent::ToolFinished {
                name,
                is_error,
                duration_ms,
            } => {
                self.finish_current();
                if self.verbosity.show_events() {
                    let icon = if is_error { "✗".red() } else { "✓".green() };
                    println!("{} {} {}", icon, name, format!("({}ms)", duration_ms).dimmed());
                }
            }
            AgentEvent::ThrottleWait {
                ledger, wait, usage, limit,
            } => self.start_spinner(format!(
                "Token budget reached ({} {} of {} in the last minute). Waiting {}s...",
                usage,
                ledger,
                limit,
                wait.as_secs().max(1)
            )),
            AgentEvent::ThrottleResumed { .. } => self.finish_current(),
            AgentEvent::RateLimited { backoff, .. } => {
                self.start_spinner(format!("Rate limit hit. Waiting {}s...", backoff.as_secs()))
            }
            AgentEvent::SessionReset => self.show_info("Resetting context..."),
            AgentEvent::ProviderError { .. } => self.finish_current(),
            AgentEvent::SessionInitialized { .. } | AgentEvent::SessionTerminated => {}
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.finish_current();
        if !self.verbosity.show_progress() {
            return;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(self.update_interval);
        self.current_bar = Some(pb);
    }

    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Display the assistant's answer
    pub fn show_answer(&mut self, content: &str) {
        self.finish_current();
        if !content.is_empty() {
            println!("\n{}\n", content);
        }
    }

    /// Display error message
    pub fn show_error(&mut self, error: &str) {
        self.finish_current();
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    /// Display info message
    pub fn show_info(&self, info: &str) {
        if self.verbosity.show_progress() {
            println!("{}", info.yellow());
        }
    }

    fn show_debug(&self, debug: &str) {
        println!("{} {}", "Debug:".dimmed(), debug.dimmed());
    }

    pub fn show_usage(&self, report: &UsageReport) {
        println!("{}", report.to_string().cyan());
    }

    pub fn show_help(&self) {
        println!("\n{}", "Directives:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());
        for (name, description) in DIRECTIVES {
            println!("  {:<10} {}", name.green(), description);
        }
        println!("\nAnything else is sent to the agent.\n");
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        self.finish_current();
    }
}
