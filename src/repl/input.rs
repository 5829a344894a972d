//! Input handler for the REPL using rustyline
//!
//! Line editing with persistent history.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Default history file name under the home directory
pub const HISTORY_FILE: &str = ".toolbuddy_history";

pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
            prompt: "> ".to_string(),
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut handler = Self::new()?;

        if history_file.exists() {
            let _ = handler.editor.load_history(&history_file);
        }
        handler.history_path = Some(history_file);

        Ok(handler)
    }

    /// History at `~/.toolbuddy_history`, or none when there is no home
    pub fn with_default_history() -> Result<Self> {
        match dirs::home_dir() {
            Some(home) => Self::with_history(home.join(HISTORY_FILE)),
            None => Self::new(),
        }
    }

    /// Read a line of input from user
    ///
    /// Returns:
    /// - Ok(Some(input)) for normal input; Ctrl-C yields an empty line
    /// - Ok(None) for EOF (Ctrl-D)
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Save history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            self.editor.save_history(path)?;
        }
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}
