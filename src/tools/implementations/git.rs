//! Git tools: status, diff, log and commit
//!
//! Each tool refuses to run outside a repository (no `.git` directory in
//! the working directory).

use crate::errors::Result;
use crate::tools::command::{capture, shell_quote, CommandOutput};
use crate::tools::registry::ToolNamespace;
use crate::tools::types::{
    optional_bool, optional_list, optional_str, optional_u64, required_str, Tool, ToolContext, ToolOutcome,
    ToolSpec,
};
use async_trait::async_trait;
use serde_json::Value;

const NOT_A_REPOSITORY: &str = "Not a git repository. Initialize a git repository first with 'git init'.";

const LOG_FORMATS: &[&str] = &["oneline", "short", "medium", "full", "fuller"];

pub fn namespace() -> ToolNamespace {
    ToolNamespace::new("git")
        .tool(GitStatus)
        .tool(GitDiff)
        .tool(GitLog)
        .tool(GitCommit)
}

fn is_repository(ctx: &ToolContext) -> bool {
    ctx.working_dir.join(".git").is_dir()
}

/// Run a git command line, mapping failure to `"{label} failed: ..."` and
/// empty successful output to `empty_message`
async fn run_git(command_line: &str, label: &str, empty_message: Option<&str>, ctx: &ToolContext) -> ToolOutcome {
    match capture(command_line, ctx).await {
        Ok(CommandOutput { output, success: true }) => match empty_message {
            Some(message) if output.is_empty() => ToolOutcome::success(message),
            _ => ToolOutcome::success(output),
        },
        Ok(CommandOutput { output, success: false }) => {
            ToolOutcome::error(format!("{} failed: {}", label, output))
        }
        Err(message) => ToolOutcome::error(message),
    }
}

pub struct GitStatus;

#[async_trait]
impl Tool for GitStatus {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "git_status",
            "Show the working tree status: staged changes, unstaged changes and untracked files.",
        )
    }

    async fn execute(&self, _args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        if !is_repository(ctx) {
            return Ok(ToolOutcome::error(NOT_A_REPOSITORY));
        }
        Ok(run_git("git status", "Git status", None, ctx).await)
    }
}

pub struct GitDiff;

#[async_trait]
impl Tool for GitDiff {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("git_diff", "Show changes between commits, commit and working tree, etc.")
            .optional("path", "Optional path to specific file or directory to show diff for.", None)
            .optional(
                "staged",
                "Whether to show staged changes (--cached). Set to true or false.",
                Some(Value::from("false")),
            )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        if !is_repository(ctx) {
            return Ok(ToolOutcome::error(NOT_A_REPOSITORY));
        }

        let mut cmd = String::from("git diff");
        if optional_bool(args, "staged", false) {
            cmd.push_str(" --cached");
        }
        if let Some(path) = optional_str(args, "path") {
            cmd.push_str(" -- ");
            cmd.push_str(&shell_quote(path));
        }

        Ok(run_git(&cmd, "Git diff", Some("No changes found."), ctx).await)
    }
}

pub struct GitLog;

#[async_trait]
impl Tool for GitLog {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("git_log", "Show commit logs.")
            .optional("number", "Number of commits to show. Default is 10.", Some(Value::from("10")))
            .optional(
                "path",
                "Optional path to specific file or directory to show history for.",
                None,
            )
            .optional(
                "format",
                "Format of the log output. Options: 'oneline', 'short', 'medium', 'full', 'fuller'.",
                None,
            )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        if !is_repository(ctx) {
            return Ok(ToolOutcome::error(NOT_A_REPOSITORY));
        }

        let number = optional_u64(args, "number")?.unwrap_or(10);
        let mut cmd = format!("git log -n {}", number);

        // Unknown formats fall back to git's default
        if let Some(format) = optional_str(args, "format").map(str::to_lowercase) {
            if format == "oneline" {
                cmd.push_str(" --oneline");
            } else if LOG_FORMATS.contains(&format.as_str()) {
                cmd.push_str(&format!(" --format={}", format));
            }
        }
        if let Some(path) = optional_str(args, "path") {
            cmd.push_str(" -- ");
            cmd.push_str(&shell_quote(path));
        }

        Ok(run_git(&cmd, "Git log", Some("No commit history found."), ctx).await)
    }
}

pub struct GitCommit;

#[async_trait]
impl Tool for GitCommit {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "git_commit",
            "Create a git commit with the specified message. Optionally add specific files or add all changes.",
        )
        .param("message", "The commit message.")
        .optional(
            "add_all",
            "Whether to add all changes before committing. Set to true or false.",
            Some(Value::from("false")),
        )
        .optional(
            "files",
            "List of specific files to add to the commit. Ignored if add_all is true.",
            None,
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let message = required_str(args, "message")?;
        if !is_repository(ctx) {
            return Ok(ToolOutcome::error(NOT_A_REPOSITORY));
        }

        let files = optional_list(args, "files");
        let add_result = if optional_bool(args, "add_all", false) {
            if let Some(failure) = stage("git add -A", ctx).await {
                return Ok(failure);
            }
            "Added all changes.".to_string()
        } else if !files.is_empty() {
            let quoted: Vec<String> = files.iter().map(|f| shell_quote(f)).collect();
            if let Some(failure) = stage(&format!("git add -- {}", quoted.join(" ")), ctx).await {
                return Ok(failure);
            }
            format!("Added files: {}", files.join(" "))
        } else {
            "No files were added. Committing already staged changes.".to_string()
        };

        let cmd = format!("git commit -m {}", shell_quote(message));
        Ok(match capture(&cmd, ctx).await {
            Ok(CommandOutput { output, success: true }) => {
                ToolOutcome::success(format!("{}\nCommit successful: {}", add_result, output))
            }
            Ok(CommandOutput { output, success: false }) => {
                ToolOutcome::error(format!("Commit failed: {}", output))
            }
            Err(message) => ToolOutcome::error(message),
        })
    }
}

async fn stage(command_line: &str, ctx: &ToolContext) -> Option<ToolOutcome> {
    match capture(command_line, ctx).await {
        Ok(CommandOutput { success: true, .. }) => None,
        Ok(CommandOutput { output, .. }) => Some(ToolOutcome::error(format!("Git add failed: {}", output))),
        Err(message) => Some(ToolOutcome::error(message)),
    }
}
