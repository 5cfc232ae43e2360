//! Tool registry: named, shared tool instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ChatError;

use super::builtin;
use super::tool::Tool;

/// Registry of tools an agent may be given, indexed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in tools.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for tool in builtin::all_tools() {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool, replacing any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|k| k.as_str()).collect()
    }

    /// Resolve a set of names into tool handles, preserving the input order.
    pub fn resolve<'a, I>(&self, names: I) -> Result<Vec<Arc<dyn Tool>>, ChatError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| ChatError::InvalidArgument(format!("Unknown tool: {name}")))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::CURRENT_TIME_TOOL;

    #[test]
    fn builtin_registry_has_time_tool() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.names(), vec![CURRENT_TIME_TOOL]);
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        let registry = ToolRegistry::builtin();
        let err = registry.resolve(["web_search"]).unwrap_err();
        assert!(err.to_string().contains("web_search"));
    }

    #[test]
    fn resolved_tools_are_shared_not_copied() {
        let registry = ToolRegistry::builtin();
        let a = registry.resolve([CURRENT_TIME_TOOL]).unwrap();
        let b = registry.resolve([CURRENT_TIME_TOOL]).unwrap();
        assert!(Arc::ptr_eq(&a[0], &b[0]));
    }
}
