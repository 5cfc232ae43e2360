//! Immutable agent definitions and the settings they are built from.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{ChatError, Result};
use crate::tools::Tool;

/// Name, instructions, model and tools handed to the runtime for a turn.
///
/// Immutable once built. A configuration change produces a new value.
#[derive(Clone)]
pub struct AgentDefinition {
    name: String,
    instructions: String,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Look up an attached tool by name.
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("name", &self.name)
            .field("instructions", &self.instructions)
            .field("model", &self.model)
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// Build an agent definition.
///
/// Has no side effects, so repeated calls with equal inputs may be memoized.
/// The only rejected input is an empty model identifier; empty instructions
/// are allowed.
pub fn build_agent(
    name: impl Into<String>,
    instructions: impl Into<String>,
    model: impl Into<String>,
    tools: Vec<Arc<dyn Tool>>,
) -> Result<AgentDefinition> {
    let model = model.into();
    if model.trim().is_empty() {
        return Err(ChatError::InvalidArgument(
            "model identifier must not be empty".into(),
        ));
    }
    Ok(AgentDefinition {
        name: name.into(),
        instructions: instructions.into(),
        model,
        tools,
    })
}

/// The configuration an [`AgentDefinition`] is derived from; the memo key of
/// [`AgentCache`](super::AgentCache).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentSettings {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub enabled_tools: BTreeSet<String>,
}

impl AgentSettings {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            enabled_tools: BTreeSet::new(),
        }
    }

    /// Builder: enable a tool by name.
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.enabled_tools.insert(name.into());
        self
    }

    /// Copy of these settings with one tool toggled.
    pub fn toggled_tool(&self, name: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        if enabled {
            next.enabled_tools.insert(name.to_string());
        } else {
            next.enabled_tools.remove(name);
        }
        next
    }

    pub fn tool_enabled(&self, name: &str) -> bool {
        self.enabled_tools.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::{current_time_tool, CURRENT_TIME_TOOL};

    #[test]
    fn empty_model_is_rejected() {
        let err = build_agent("Assistant", "", "  ", Vec::new()).unwrap_err();
        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[test]
    fn empty_instructions_are_allowed() {
        let agent = build_agent("Assistant", "", "gpt-5-nano", vec![current_time_tool()]).unwrap();
        assert_eq!(agent.instructions(), "");
        assert_eq!(agent.tool_names(), vec![CURRENT_TIME_TOOL]);
        assert!(agent.tool(CURRENT_TIME_TOOL).is_some());
    }

    #[test]
    fn toggling_a_tool_yields_distinct_settings() {
        let base = AgentSettings::new("Assistant", "Be brief.", "gpt-5-nano");
        let with_time = base.toggled_tool(CURRENT_TIME_TOOL, true);
        assert_ne!(base, with_time);
        assert!(with_time.tool_enabled(CURRENT_TIME_TOOL));
        assert_eq!(with_time.toggled_tool(CURRENT_TIME_TOOL, false), base);
    }
}
