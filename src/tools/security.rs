//! Working-directory guard for the file tools
//!
//! Paths are resolved against the working directory and must stay inside
//! it after symlinks and `..` are resolved. Restricted file names (secrets
//! such as `.env`) are refused regardless of location.

use crate::errors::{AgentError, Result};
use std::path::{Component, Path, PathBuf};

/// Message returned instead of the contents of a restricted file
pub const RESTRICTED_MESSAGE: &str = "Access to this file is restricted for security reasons. \
This file contains sensitive configuration and cannot be accessed.";

/// Path guard rooted at the working directory
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonicalized root directory
    root: PathBuf,

    /// File names that may not be read or written
    restricted: Vec<String>,
}

impl WorkspaceGuard {
    pub fn new(root: impl AsRef<Path>, restricted: &[String]) -> Result<Self> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(AgentError::ConfigError(format!(
                "Working directory does not exist: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            AgentError::ConfigError(format!("Failed to canonicalize working directory: {}", e))
        })?;

        Ok(Self {
            root,
            restricted: restricted.to_vec(),
        })
    }

    /// Whether the final component of `path` is a restricted file name
    pub fn is_restricted(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.restricted.iter().any(|r| r == name))
            .unwrap_or(false)
    }

    /// Resolve `path` to an absolute path inside the root.
    ///
    /// Missing trailing components are allowed (for writes): the deepest
    /// existing ancestor is canonicalized and checked, and the remaining
    /// components may not contain `..`.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut existing = full_path.as_path();
        let mut pending: Vec<&std::ffi::OsStr> = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.components().next_back()) {
                (Some(parent), Some(Component::Normal(name))) => {
                    pending.push(name);
                    existing = parent;
                }
                _ => {
                    return Err(AgentError::ToolExecution(format!(
                        "Path escapes working directory: {}",
                        path.display()
                    )))
                }
            }
        }

        let mut resolved = existing.canonicalize()?;
        if !resolved.starts_with(&self.root) {
            return Err(AgentError::ToolExecution(format!(
                "Path escapes working directory: {}",
                path.display()
            )));
        }

        for name in pending.into_iter().rev() {
            resolved.push(name);
        }
        Ok(resolved)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render an absolute path relative to the root for tool output
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}
