//! Shell command helper for subprocess-backed tools
//!
//! Runs a command line through the platform shell with stderr folded into
//! stdout, and shapes the result as `{command, result}` or
//! `{command, error}`.

use crate::tools::types::{ToolContext, ToolOutcome};
use serde_json::json;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Captured output of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Combined stdout and stderr, trimmed
    pub output: String,
    pub success: bool,
}

/// Run a command line and capture its combined output.
///
/// Returns `Err` with a human readable message when the process could not be
/// spawned or ran past the context timeout.
pub async fn capture(command_line: &str, ctx: &ToolContext) -> Result<CommandOutput, String> {
    let start = Instant::now();
    let mut cmd = shell_command(command_line);
    cmd.current_dir(&ctx.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(ctx.timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(format!("Failed to execute command: {}", e)),
        Err(_) => return Err(format!("Command timed out after {}s", ctx.timeout.as_secs())),
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    debug!(
        command = %command_line,
        status = ?output.status.code(),
        duration_ms = start.elapsed().as_millis() as u64,
        "command finished"
    );

    Ok(CommandOutput {
        output: combined.trim().to_string(),
        success: output.status.success(),
    })
}

/// Run a command line for a tool.
///
/// On success the result is `success_message` when given, otherwise the
/// trimmed output (which may be empty). On failure the error is
/// `"Command failed: " + trimmed output`.
pub async fn run_external_command(
    command_line: &str,
    success_message: Option<&str>,
    ctx: &ToolContext,
) -> ToolOutcome {
    match capture(command_line, ctx).await {
        Ok(CommandOutput { output, success: true }) => ToolOutcome::success(json!({
            "command": command_line,
            "result": success_message.map(str::to_string).unwrap_or(output),
        })),
        Ok(CommandOutput { output, success: false }) => {
            ToolOutcome::command_error(command_line, format!("Command failed: {}", output))
        }
        Err(message) => ToolOutcome::command_error(command_line, message),
    }
}

/// Quote a single argument for the POSIX shell
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+~".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    // Redirect inside the shell so stdout and stderr interleave in order
    let mut c = Command::new("sh");
    c.arg("-c").arg(format!("exec 2>&1\n{}", command_line));
    c
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut c = Command::new("cmd");
    c.arg("/C").arg(format!("{} 2>&1", command_line));
    c
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> ToolContext {
        ToolContext::new(dir.path().to_path_buf()).with_timeout(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_success_returns_trimmed_output() {
        let dir = TempDir::new().unwrap();
        let outcome = run_external_command("echo '  hello  '", None, &ctx(&dir)).await;
        assert_eq!(
            outcome,
            ToolOutcome::success(json!({"command": "echo '  hello  '", "result": "hello"}))
        );
    }

    #[tokio::test]
    async fn test_success_message_overrides_output() {
        let dir = TempDir::new().unwrap();
        let outcome = run_external_command("echo noisy", Some("OK"), &ctx(&dir)).await;
        assert_eq!(
            outcome,
            ToolOutcome::success(json!({"command": "echo noisy", "result": "OK"}))
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_success() {
        let dir = TempDir::new().unwrap();
        let outcome = run_external_command("true", None, &ctx(&dir)).await;
        assert_eq!(outcome, ToolOutcome::success(json!({"command": "true", "result": ""})));
    }

    #[tokio::test]
    async fn test_failure_includes_stderr() {
        let dir = TempDir::new().unwrap();
        let line = "echo 'went wrong' 1>&2; exit 3";
        let outcome = run_external_command(line, Some("OK"), &ctx(&dir)).await;
        assert_eq!(outcome, ToolOutcome::command_error(line, "Command failed: went wrong"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let output = capture("ls", &ctx(&dir)).await.unwrap();
        assert!(output.success);
        assert!(output.output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf()).with_timeout(Duration::from_millis(200));
        let outcome = run_external_command("sleep 5", None, &ctx).await;
        assert!(outcome.error_message().unwrap().contains("timed out"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("src/main.rb"), "src/main.rb");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
