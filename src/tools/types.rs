//! Tool contract types
//!
//! Descriptors, execution context, outcomes and argument helpers shared by
//! every tool implementation.

use crate::errors::{AgentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Files the file tools refuse to touch by default
pub const DEFAULT_RESTRICTED_FILES: &[&str] = &[".env", ".mise.toml"];

/// A single declared tool parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Immutable tool descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ToolParam>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Declare a required parameter
    pub fn param(mut self, name: &str, description: &str) -> Self {
        self.params.push(ToolParam {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
        });
        self
    }

    /// Declare an optional parameter
    pub fn optional(mut self, name: &str, description: &str, default: Option<Value>) -> Self {
        self.params.push(ToolParam {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default,
        });
        self
    }

    /// JSON Schema for the parameter object, as providers expect it.
    ///
    /// Every parameter is typed as a string; models pass booleans and numbers
    /// as text often enough that the argument helpers accept both.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = json!({
                "type": "string",
                "description": param.description,
            });
            if let Some(default) = &param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Execution context handed to every tool
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory tools operate in
    pub working_dir: PathBuf,

    /// Upper bound on subprocess runtime
    pub timeout: Duration,

    /// File names the file tools refuse to read or write
    pub restricted_files: Vec<String>,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| ".".into()),
            timeout: Duration::from_secs(60),
            restricted_files: DEFAULT_RESTRICTED_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ToolContext {
    /// Create new tool context with working directory
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the restricted file list
    pub fn with_restricted_files(mut self, files: Vec<String>) -> Self {
        self.restricted_files = files;
        self
    }
}

/// Structured failure returned to the provider in place of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub error: String,
}

/// Outcome of exactly one tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Failure(ToolFailure),
    Success(Value),
}

impl ToolOutcome {
    pub fn success(value: impl Into<Value>) -> Self {
        ToolOutcome::Success(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Failure(ToolFailure {
            command: None,
            error: message.into(),
        })
    }

    pub fn command_error(command: impl Into<String>, message: impl Into<String>) -> Self {
        ToolOutcome::Failure(ToolFailure {
            command: Some(command.into()),
            error: message.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    /// Error message, if this is a failure
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Failure(f) => Some(&f.error),
            ToolOutcome::Success(_) => None,
        }
    }

    /// Text fed back into the conversation as the tool's output
    pub fn to_message_content(&self) -> String {
        match self {
            ToolOutcome::Success(Value::String(s)) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e)),
        }
    }
}

/// The invocable tool contract
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor: name, description, parameters
    fn spec(&self) -> ToolSpec;

    /// Run the tool. Errors are converted into `{error}` by the invocation
    /// wrapper, so implementations may use `?` freely.
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutcome>;
}

/// Required string argument
pub fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::missing_argument(name))
}

/// Optional string argument; empty strings count as absent
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Optional boolean; accepts JSON booleans and "true"/"false" text
pub fn optional_bool(args: &Value, name: &str, default: bool) -> bool {
    match args.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Optional unsigned integer; accepts numbers and numeric text
pub fn optional_u64(args: &Value, name: &str) -> Result<Option<u64>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| AgentError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a non-negative integer, got {}", n),
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| AgentError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a non-negative integer, got '{}'", s),
        }),
        Some(other) => Err(AgentError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a non-negative integer, got {}", other),
        }),
    }
}

/// Optional list of strings; accepts an array or a space-separated string
pub fn optional_list(args: &Value, name: &str) -> Vec<String> {
    match args.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_schema() {
        let spec = ToolSpec::new("read_file", "Show file contents")
            .param("path", "File path to read")
            .optional("limit", "Max lines", Some(json!("100")));

        let schema = spec.json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["path"]));
        assert_eq!(schema["properties"]["limit"]["default"], "100");
        assert_eq!(spec.params.len(), 2);
        assert!(spec.params[0].required);
        assert!(!spec.params[1].required);
    }

    #[test]
    fn test_outcome_serialization() {
        let failure = ToolOutcome::error("boom");
        assert_eq!(serde_json::to_value(&failure).unwrap(), json!({"error": "boom"}));

        let cmd = ToolOutcome::command_error("git status", "Command failed: nope");
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"command": "git status", "error": "Command failed: nope"})
        );

        let ok = ToolOutcome::success(json!(["a", "b/"]));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!(["a", "b/"]));
    }

    #[test]
    fn test_outcome_message_content() {
        assert_eq!(ToolOutcome::success("plain text").to_message_content(), "plain text");
        assert_eq!(ToolOutcome::error("bad").to_message_content(), r#"{"error":"bad"}"#);
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({
            "path": "src",
            "empty": "",
            "flag": "true",
            "count": "7",
            "files": "a.rb b.rb",
            "list": ["x", "y"],
        });

        assert_eq!(required_str(&args, "path").unwrap(), "src");
        assert!(required_str(&args, "missing").is_err());
        assert_eq!(optional_str(&args, "empty"), None);
        assert!(optional_bool(&args, "flag", false));
        assert!(optional_bool(&args, "missing", true));
        assert_eq!(optional_u64(&args, "count").unwrap(), Some(7));
        assert_eq!(optional_u64(&args, "missing").unwrap(), None);
        assert_eq!(optional_list(&args, "files"), vec!["a.rb", "b.rb"]);
        assert_eq!(optional_list(&args, "list"), vec!["x", "y"]);
    }

    #[test]
    fn test_optional_u64_rejects_garbage() {
        let args = json!({"count": "ten"});
        assert!(optional_u64(&args, "count").is_err());
    }

    #[test]
    fn test_tool_context_builder() {
        let ctx = ToolContext::new("/tmp".into())
            .with_timeout(Duration::from_secs(5))
            .with_restricted_files(vec!["secrets.yml".to_string()]);

        assert_eq!(ctx.timeout, Duration::from_secs(5));
        assert_eq!(ctx.restricted_files, vec!["secrets.yml"]);
    }
}
