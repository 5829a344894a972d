//! Tool registry
//!
//! Tools are declared in namespaces that may nest. The registry flattens a
//! namespace tree into one ordered list: within a namespace its own tools
//! come first in declaration order, then each nested namespace in
//! declaration order, depth-first. Duplicates are kept.

use crate::tools::implementations;
use crate::tools::types::{Tool, ToolSpec};
use std::sync::Arc;

/// A member of a namespace
#[derive(Clone)]
pub enum NamespaceEntry {
    Tool(Arc<dyn Tool>),
    Namespace(ToolNamespace),
}

/// Named group of tools and nested groups
#[derive(Clone)]
pub struct ToolNamespace {
    name: String,
    entries: Vec<NamespaceEntry>,
}

impl ToolNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Declare a tool in this namespace
    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.entries.push(NamespaceEntry::Tool(Arc::new(tool)));
        self
    }

    /// Declare an already shared tool
    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.entries.push(NamespaceEntry::Tool(tool));
        self
    }

    /// Declare a nested namespace
    pub fn nest(mut self, namespace: ToolNamespace) -> Self {
        self.entries.push(NamespaceEntry::Namespace(namespace));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[NamespaceEntry] {
        &self.entries
    }
}

/// Flatten a namespace tree into an ordered tool list
pub fn collect_tools(namespace: &ToolNamespace) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = namespace
        .entries
        .iter()
        .filter_map(|entry| match entry {
            NamespaceEntry::Tool(tool) => Some(Arc::clone(tool)),
            NamespaceEntry::Namespace(_) => None,
        })
        .collect();

    for entry in &namespace.entries {
        if let NamespaceEntry::Namespace(nested) = entry {
            tools.extend(collect_tools(nested));
        }
    }

    tools
}

/// The default namespace tree: every built-in tool
pub fn builtin_namespace() -> ToolNamespace {
    ToolNamespace::new("tools")
        .nest(implementations::files::namespace())
        .nest(implementations::git::namespace())
        .nest(implementations::bundler::namespace())
        .nest(implementations::rubocop::namespace())
        .nest(implementations::user_input::namespace())
}

/// Flattened, immutable tool set
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry holding every built-in tool
    pub fn new() -> Self {
        Self::from_namespace(&builtin_namespace())
    }

    pub fn from_namespace(namespace: &ToolNamespace) -> Self {
        Self {
            tools: collect_tools(namespace),
        }
    }

    /// First registered tool with the given name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name == name).cloned()
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.spec().name).collect()
    }

    /// Descriptors in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::tools::types::{ToolContext, ToolOutcome};
    use async_trait::async_trait;
    use serde_json::Value;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(self.0, "test tool")
        }

        async fn execute(&self, _args: &Value, _ctx: &ToolContext) -> Result<ToolOutcome> {
            Ok(ToolOutcome::success(self.0))
        }
    }

    fn names(tools: &[Arc<dyn Tool>]) -> Vec<String> {
        tools.iter().map(|t| t.spec().name).collect()
    }

    #[test]
    fn test_empty_namespace() {
        assert!(collect_tools(&ToolNamespace::new("empty")).is_empty());
    }

    #[test]
    fn test_flatten_counts_and_order() {
        let ns = ToolNamespace::new("root")
            .tool(Named("a"))
            .nest(
                ToolNamespace::new("inner")
                    .tool(Named("x"))
                    .tool(Named("y"))
                    .nest(ToolNamespace::new("deep").tool(Named("z"))),
            )
            .tool(Named("b"))
            .nest(ToolNamespace::new("other").tool(Named("w")));

        let tools = collect_tools(&ns);
        assert_eq!(tools.len(), 2 + 3 + 1);
        assert_eq!(names(&tools), vec!["a", "b", "x", "y", "z", "w"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let shared: Arc<dyn Tool> = Arc::new(Named("dup"));
        let ns = ToolNamespace::new("root")
            .shared_tool(Arc::clone(&shared))
            .nest(ToolNamespace::new("again").shared_tool(shared));

        let registry = ToolRegistry::from_namespace(&ns);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("dup"));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.len(), 21);
        assert!(!registry.is_empty());

        for name in [
            "list_files",
            "read_file",
            "write_file",
            "edit_file",
            "find_files",
            "append_file",
            "git_status",
            "git_diff",
            "git_log",
            "git_commit",
            "bundle_install",
            "bundle_outdated",
            "rubocop_lint",
            "rubocop_explain",
            "request_user_input",
        ] {
            assert!(registry.contains(name), "missing tool {}", name);
        }
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut names = ToolRegistry::new().tool_names();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_specs_have_descriptions() {
        for spec in ToolRegistry::new().specs() {
            assert!(!spec.name.is_empty());
            assert!(!spec.description.is_empty());
        }
    }

    #[test]
    fn test_nonexistent_tool() {
        let registry = ToolRegistry::new();
        assert!(!registry.contains("nonexistent_tool"));
        assert!(registry.get("nonexistent_tool").is_none());
    }
}
