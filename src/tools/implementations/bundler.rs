//! Bundler tools
//!
//! Thin wrappers over `bundle` subcommands. Results follow the external
//! command shape: `{command, result}` on success, `{command, error}` on
//! failure.

use crate::errors::Result;
use crate::tools::command::{run_external_command, shell_quote};
use crate::tools::registry::ToolNamespace;
use crate::tools::types::{optional_list, optional_str, required_str, Tool, ToolContext, ToolOutcome, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};

pub fn namespace() -> ToolNamespace {
    ToolNamespace::new("bundler")
        .tool(BundleInstall)
        .tool(BundleUpdate)
        .tool(BundleAdd)
        .tool(BundleRemove)
        .tool(BundleList)
        .tool(BundleInfo)
        .tool(BundleOutdated)
}

/// Append `--{flag}={value}` when the argument is present
fn push_flag(cmd: &mut String, args: &Value, name: &str, flag: &str) {
    if let Some(value) = optional_str(args, name) {
        cmd.push_str(&format!(" --{}={}", flag, shell_quote(value)));
    }
}

pub struct BundleInstall;

#[async_trait]
impl Tool for BundleInstall {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_install", "Install the dependencies specified in your Gemfile")
            .optional(
                "path",
                "Specify a different path than the current directory for the Gemfile",
                None,
            )
            .optional("without", "Exclude gems that are part of the specified named group", None)
            .optional("jobs", "Install gems using parallel workers", None)
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let mut cmd = String::from("bundle install");
        push_flag(&mut cmd, args, "path", "path");
        push_flag(&mut cmd, args, "without", "without");
        push_flag(&mut cmd, args, "jobs", "jobs");
        Ok(run_external_command(&cmd, Some("Bundle install succeeded"), ctx).await)
    }
}

pub struct BundleUpdate;

#[async_trait]
impl Tool for BundleUpdate {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_update", "Update the gems specified (all gems if none specified)")
            .optional("gems", "Optional list of gems to update", None)
            .optional("group", "Only update the gems in the specified group", None)
            .optional("source", "The name of a source to update", None)
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let mut cmd = String::from("bundle update");
        for gem in optional_list(args, "gems") {
            cmd.push(' ');
            cmd.push_str(&shell_quote(&gem));
        }
        push_flag(&mut cmd, args, "group", "group");
        push_flag(&mut cmd, args, "source", "source");
        Ok(run_external_command(&cmd, Some("Bundle update succeeded"), ctx).await)
    }
}

pub struct BundleAdd;

#[async_trait]
impl Tool for BundleAdd {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_add", "Add the specified gem to the Gemfile and run bundle install")
            .param("gem_name", "The name of the gem to add")
            .optional("version", "The version of the gem to add (e.g., '~> 1.0.0')", None)
            .optional("group", "The group to add the gem to (e.g., 'development')", None)
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let gem_name = required_str(args, "gem_name")?;
        let mut cmd = format!("bundle add {}", shell_quote(gem_name));
        push_flag(&mut cmd, args, "version", "version");
        push_flag(&mut cmd, args, "group", "group");
        Ok(run_external_command(&cmd, Some("Bundle add succeeded"), ctx).await)
    }
}

pub struct BundleRemove;

#[async_trait]
impl Tool for BundleRemove {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "bundle_remove",
            "Remove the specified gem from the Gemfile and run bundle install",
        )
        .param("gem_name", "The name of the gem to remove")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let gem_name = required_str(args, "gem_name")?;
        let cmd = format!("bundle remove {}", shell_quote(gem_name));
        Ok(run_external_command(&cmd, Some("Bundle remove succeeded"), ctx).await)
    }
}

pub struct BundleList;

#[async_trait]
impl Tool for BundleList {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_list", "List all gems in the bundle")
            .optional("name", "Filter for gems with the specified name", None)
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let mut cmd = String::from("bundle list");
        push_flag(&mut cmd, args, "name", "name");
        Ok(run_external_command(&cmd, None, ctx).await)
    }
}

pub struct BundleInfo;

#[async_trait]
impl Tool for BundleInfo {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_info", "Show information for the specified gem in the bundle")
            .param("gem_name", "The name of the gem to get info for")
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let gem_name = required_str(args, "gem_name")?;
        let cmd = format!("bundle info {}", shell_quote(gem_name));
        Ok(run_external_command(&cmd, None, ctx).await)
    }
}

pub struct BundleOutdated;

#[async_trait]
impl Tool for BundleOutdated {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("bundle_outdated", "Show all outdated gems in the bundle")
            .optional("filter", "Only list gems with names matching this filter", None)
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let mut cmd = String::from("bundle outdated");
        if let Some(filter) = optional_str(args, "filter") {
            cmd.push(' ');
            cmd.push_str(&shell_quote(filter));
        }

        let outcome = run_external_command(&cmd, None, ctx).await;
        Ok(match outcome {
            ToolOutcome::Success(value) if value["result"] == "" => ToolOutcome::success(json!({
                "command": cmd,
                "result": "No outdated gems found.",
            })),
            other => other,
        })
    }
}
