//! Working directory and per-project agent files
//!
//! A project can carry `.ai/instructions.txt` (system instructions for every
//! conversation) and `.ai/prompt.txt` (first message sent at startup).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const AI_DIR: &str = ".ai";
const INSTRUCTIONS_FILE: &str = "instructions.txt";
const PROMPT_FILE: &str = "prompt.txt";

#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Open `dir`, creating it if it doesn't exist
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create working directory {}", dir.display()))?;
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve working directory {}", dir.display()))?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Trimmed contents of `.ai/instructions.txt`, if present and non-empty
    pub fn instructions(&self) -> Result<Option<String>> {
        self.read_ai_file(INSTRUCTIONS_FILE)
    }

    /// Trimmed contents of `.ai/prompt.txt`, if present and non-empty
    pub fn prompt(&self) -> Result<Option<String>> {
        self.read_ai_file(PROMPT_FILE)
    }

    fn read_ai_file(&self, name: &str) -> Result<Option<String>> {
        let path = self.dir.join(AI_DIR).join(name);
        if !path.is_file() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}
