//! RuboCop tools: lint, autocorrect and cop explanations

use crate::errors::Result;
use crate::tools::command::{capture, shell_quote, CommandOutput};
use crate::tools::registry::ToolNamespace;
use crate::tools::types::{optional_bool, optional_str, required_str, Tool, ToolContext, ToolOutcome, ToolSpec};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;

pub fn namespace() -> ToolNamespace {
    ToolNamespace::new("rubocop")
        .tool(RubocopLint)
        .tool(RubocopAutocorrect)
        .tool(RubocopExplain)
}

#[derive(Debug, Deserialize)]
struct LintReport {
    summary: LintSummary,
    files: Vec<LintFile>,
}

#[derive(Debug, Deserialize)]
struct LintSummary {
    offense_count: u64,
}

#[derive(Debug, Deserialize)]
struct LintFile {
    path: String,
    #[serde(default)]
    offenses: Vec<Offense>,
}

#[derive(Debug, Deserialize)]
struct Offense {
    message: String,
    cop_name: String,
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    line: u64,
}

/// Render RuboCop's JSON report as a short text summary
fn summarize(report: &LintReport) -> String {
    let mut text = format!(
        "RuboCop: {} offense(s) in {} file(s)\n\n",
        report.summary.offense_count,
        report.files.len()
    );

    for file in report.files.iter().filter(|f| !f.offenses.is_empty()) {
        let _ = writeln!(text, "File: {}", file.path);
        for offense in &file.offenses {
            let _ = writeln!(
                text,
                "  Line {}: {} ({})",
                offense.location.line, offense.message, offense.cop_name
            );
        }
        text.push('\n');
    }

    text
}

fn path_suffix(args: &Value) -> String {
    optional_str(args, "path")
        .map(|p| format!(" {}", shell_quote(p)))
        .unwrap_or_default()
}

pub struct RubocopLint;

#[async_trait]
impl Tool for RubocopLint {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "rubocop_lint",
            "Run RuboCop to lint your Ruby code and get a report of all offenses.",
        )
        .optional(
            "path",
            "Optional path to specific file or directory to lint. If not provided, all files will be checked.",
            None,
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let cmd = format!("bundle exec rubocop{} --format json", path_suffix(args));
        let CommandOutput { output, success } = match capture(&cmd, ctx).await {
            Ok(output) => output,
            Err(message) => return Ok(ToolOutcome::error(message)),
        };

        // RuboCop exits non-zero when offenses exist, so parse first
        Ok(match serde_json::from_str::<LintReport>(&output) {
            Ok(report) => ToolOutcome::success(summarize(&report)),
            Err(_) if success => ToolOutcome::success(output),
            Err(_) => ToolOutcome::error(format!("RuboCop lint failed: {}", output)),
        })
    }
}

pub struct RubocopAutocorrect;

#[async_trait]
impl Tool for RubocopAutocorrect {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "rubocop_autocorrect",
            "Run RuboCop autocorrect to automatically fix offenses in your Ruby code.",
        )
        .optional(
            "path",
            "Optional path to specific file or directory to autocorrect. If not provided, all files will be corrected.",
            None,
        )
        .optional(
            "safe",
            "Whether to use safe autocorrection (true) or unsafe autocorrection (false). Default is true.",
            Some(Value::from("true")),
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let flag = if optional_bool(args, "safe", true) { "-a" } else { "-A" };
        let cmd = format!("bundle exec rubocop {}{}", flag, path_suffix(args));

        Ok(match capture(&cmd, ctx).await {
            Ok(CommandOutput { output, success: true }) => {
                ToolOutcome::success(format!("RuboCop autocorrection completed:\n{}", output))
            }
            Ok(CommandOutput { output, success: false }) => ToolOutcome::error(format!("Failed: {}", output)),
            Err(message) => ToolOutcome::error(message),
        })
    }
}

pub struct RubocopExplain;

#[async_trait]
impl Tool for RubocopExplain {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "rubocop_explain",
            "Get an explanation for a specific RuboCop cop or offense.",
        )
        .param(
            "cop_name",
            "The name of the RuboCop cop to explain (e.g., 'Style/StringLiterals').",
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let cop_name = required_str(args, "cop_name")?;
        let cmd = format!("bundle exec rubocop --show-docs-url {}", shell_quote(cop_name));

        Ok(match capture(&cmd, ctx).await {
            Ok(CommandOutput { output, success: true }) if output.contains("no documentation") => {
                ToolOutcome::success(format!("No docs for {}", cop_name))
            }
            Ok(CommandOutput { output, success: true }) => {
                ToolOutcome::success(format!("{}:\n{}", cop_name, output))
            }
            Ok(CommandOutput { output, success: false }) => ToolOutcome::error(format!("Failed: {}", output)),
            Err(message) => ToolOutcome::error(message),
        })
    }
}
