//! File tools
//!
//! - list_files: list the entries of a directory
//! - read_file: read a file's contents
//! - write_file: create or overwrite a file
//! - edit_file: replace text in a file
//! - find_files: glob for files under a directory
//! - append_file: add content to the end of a file
//!
//! Every path is resolved through [`WorkspaceGuard`] and restricted file
//! names are answered with a refusal message instead of their contents.

use crate::errors::{AgentError, Result};
use crate::tools::registry::ToolNamespace;
use crate::tools::security::{WorkspaceGuard, RESTRICTED_MESSAGE};
use crate::tools::types::{optional_str, required_str, Tool, ToolContext, ToolOutcome, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub fn namespace() -> ToolNamespace {
    ToolNamespace::new("files")
        .tool(ListFiles)
        .tool(ReadFile)
        .tool(WriteFile)
        .tool(EditFile)
        .tool(FindFiles)
        .tool(AppendFile)
}

fn guard(ctx: &ToolContext) -> Result<WorkspaceGuard> {
    WorkspaceGuard::new(&ctx.working_dir, &ctx.restricted_files)
}

pub struct ListFiles;

#[async_trait]
impl Tool for ListFiles {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "list_files",
            "List files and directories at a given path. If no path is provided, lists files in the current directory.",
        )
        .optional(
            "path",
            "Optional relative path to list files from. Defaults to current directory if not provided.",
            None,
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let guard = guard(ctx)?;
        let requested = optional_str(args, "path").unwrap_or("");
        let dir = guard.resolve(if requested.is_empty() { "." } else { requested })?;

        if !dir.is_dir() {
            return Ok(ToolOutcome::error(format!("Not a directory: {}", requested)));
        }

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            // Hidden entries are skipped, matching shell globbing
            if name.starts_with('.') {
                continue;
            }

            let display = if requested.is_empty() {
                name
            } else {
                Path::new(requested).join(&name).to_string_lossy().to_string()
            };

            if entry.file_type().await?.is_dir() {
                entries.push(format!("{}/", display));
            } else {
                entries.push(display);
            }
        }

        entries.sort();
        Ok(ToolOutcome::success(json!(entries)))
    }
}

pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "read_file",
            "Read the contents of a given relative file path. Use this when you want to see what's inside a file. Do not use this with directory names.",
        )
        .param("path", "The relative path of a file in the working directory.")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let path = required_str(args, "path")?;
        let guard = guard(ctx)?;
        if guard.is_restricted(path) {
            return Ok(ToolOutcome::success(RESTRICTED_MESSAGE));
        }

        let resolved = guard.resolve(path)?;
        if resolved.is_dir() {
            return Ok(ToolOutcome::error(format!("Is a directory: {}", path)));
        }

        let content = fs::read_to_string(&resolved)
            .await
            .map_err(|e| AgentError::ToolExecution(format!("Failed to read {}: {}", path, e)))?;
        Ok(ToolOutcome::success(content))
    }
}

pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "write_file",
            "Write content to a file at the given path. Creates the file and any missing parent directories, overwriting existing content.",
        )
        .param("path", "The relative path of the file to write")
        .param("content", "The content to write to the file")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let path = required_str(args, "path")?;
        let content = required_str(args, "content")?;
        let guard = guard(ctx)?;
        if guard.is_restricted(path) {
            return Ok(ToolOutcome::success(RESTRICTED_MESSAGE));
        }

        let resolved = guard.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&resolved, content).await?;

        Ok(ToolOutcome::success(format!(
            "Successfully wrote {} bytes to {}",
            content.len(),
            guard.display_relative(&resolved)
        )))
    }
}

pub struct EditFile;

#[async_trait]
impl Tool for EditFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "edit_file",
            "Make edits to a text file. Replaces the first occurrence of 'old_str' with 'new_str'. \
             If the file does not exist and 'old_str' is empty, it is created with 'new_str' as its content.",
        )
        .param("path", "The path to the file")
        .param("old_str", "Text to search for - must match exactly")
        .param("new_str", "Text to replace old_str with")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let path = required_str(args, "path")?;
        let old_str = args.get("old_str").and_then(Value::as_str).unwrap_or("");
        let new_str = required_str(args, "new_str")?;
        let guard = guard(ctx)?;
        if guard.is_restricted(path) {
            return Ok(ToolOutcome::success(RESTRICTED_MESSAGE));
        }

        if old_str == new_str {
            return Ok(ToolOutcome::error("old_str and new_str must be different"));
        }

        let resolved = guard.resolve(path)?;
        let content = if resolved.exists() {
            fs::read_to_string(&resolved).await?
        } else {
            String::new()
        };

        let updated = if old_str.is_empty() {
            format!("{}{}", new_str, content)
        } else if content.contains(old_str) {
            content.replacen(old_str, new_str, 1)
        } else {
            return Ok(ToolOutcome::error(format!("old_str not found in {}", path)));
        };

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&resolved, &updated).await?;

        Ok(ToolOutcome::success(format!("Edited {}", guard.display_relative(&resolved))))
    }
}

pub struct FindFiles;

#[async_trait]
impl Tool for FindFiles {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("find_files", "Find files matching a glob pattern")
            .param("pattern", "Glob pattern to match files (e.g., \"**/*.rb\")")
            .optional("path", "Base directory to search from", Some(json!(".")))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let pattern = required_str(args, "pattern")?;
        let guard = guard(ctx)?;

        let relative = Path::new(pattern);
        if relative.is_absolute() || relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Ok(ToolOutcome::error(format!(
                "Pattern must stay inside the working directory: {}",
                pattern
            )));
        }

        let requested = optional_str(args, "path").unwrap_or(".");
        let base = guard.resolve(if requested.is_empty() { "." } else { requested })?;
        if !base.is_dir() {
            return Ok(ToolOutcome::error(format!("Not a directory: {}", requested)));
        }

        let full_pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&base.to_string_lossy()),
            pattern
        );
        let paths = glob::glob(&full_pattern)
            .map_err(|e| AgentError::ToolExecution(format!("Invalid glob pattern: {}", e)))?;

        let mut matches: Vec<String> = paths
            .filter_map(|entry| entry.ok())
            .filter_map(|path| path.canonicalize().ok())
            .filter(|path| path.starts_with(guard.root()))
            .map(|path| guard.display_relative(&path))
            .collect();
        matches.sort();

        Ok(ToolOutcome::success(json!(matches)))
    }
}

pub struct AppendFile;

#[async_trait]
impl Tool for AppendFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("append_file", "Append content to a file, creating it if it does not exist")
            .param("path", "File path")
            .param("content", "Content to append")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let path = required_str(args, "path")?;
        let content = required_str(args, "content")?;
        let guard = guard(ctx)?;
        if guard.is_restricted(path) {
            return Ok(ToolOutcome::success(RESTRICTED_MESSAGE));
        }

        let resolved = guard.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&resolved)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(ToolOutcome::success(format!(
            "Content appended to {}",
            guard.display_relative(&resolved)
        )))
    }
}
