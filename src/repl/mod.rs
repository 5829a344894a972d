//! REPL (Read-Eval-Print Loop) for the interactive session
//!
//! Reads operator lines, handles the reserved directives, and sends
//! everything else through the chat driver while rendering its events.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::Path;
use tokio::sync::mpsc;

use crate::agent::{AgentEvent, ChatDriver};
use crate::cli::Verbosity;
use crate::repl::commands::{parse, Directive};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::InputHandler;

pub struct ReplSession {
    input_handler: InputHandler,
    display_manager: DisplayManager,
    events: mpsc::Receiver<AgentEvent>,
}

impl ReplSession {
    pub fn new(input_handler: InputHandler, verbosity: Verbosity, events: mpsc::Receiver<AgentEvent>) -> Self {
        ReplSession {
            input_handler,
            display_manager: DisplayManager::new(verbosity),
            events,
        }
    }

    pub fn show_welcome(&self, version: &str, driver: &ChatDriver, working_dir: &Path) {
        self.display_manager
            .show_banner(version, driver.model(), working_dir, driver.registry().len());
    }

    /// Run until `exit` or EOF. `first_prompt` is sent before reading input.
    pub async fn run(&mut self, driver: &mut ChatDriver, first_prompt: Option<String>) -> Result<()> {
        driver.initialize_session()?;

        if let Some(prompt) = first_prompt {
            self.dispatch(driver, &prompt).await;
        }

        while let Some(line) = self.input_handler.read_line()? {
            match parse(&line) {
                Directive::Exit => break,
                Directive::Empty => continue,
                Directive::Help => self.display_manager.show_help(),
                Directive::Usage => self.display_manager.show_usage(&driver.usage_report()),
                Directive::Reset => {
                    driver.reset()?;
                    self.drain_events();
                }
                Directive::Message(message) => self.dispatch(driver, &message).await,
            }
        }

        driver.terminate()?;
        self.input_handler.save_history()?;
        Ok(())
    }

    /// Send one message, rendering driver events while it runs. Failures
    /// are reported and the session carries on.
    async fn dispatch(&mut self, driver: &mut ChatDriver, message: &str) {
        let send = driver.send(message);
        tokio::pin!(send);

        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                Some(event) = self.events.recv() => self.display_manager.handle_event(event),
            }
        };
        self.drain_events();

        match result {
            Ok(content) => self.display_manager.show_answer(&content),
            Err(err) => self.display_manager.show_error(&err.to_string()),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.display_manager.handle_event(event);
        }
    }
}
