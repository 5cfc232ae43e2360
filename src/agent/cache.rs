//! Memoization of agent definitions by configuration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::Result;
use crate::tools::ToolRegistry;

use super::definition::{build_agent, AgentDefinition, AgentSettings};

/// Process-lifetime table of `AgentSettings -> AgentDefinition`.
///
/// Entries are only ever inserted whole or removed; an existing definition is
/// never patched.
#[derive(Debug, Default)]
pub struct AgentCache {
    entries: Mutex<HashMap<AgentSettings, Arc<AgentDefinition>>>,
}

impl AgentCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AgentSettings, Arc<AgentDefinition>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached definition for `settings`, building it on first use.
    pub fn get_or_build(
        &self,
        settings: &AgentSettings,
        registry: &ToolRegistry,
    ) -> Result<Arc<AgentDefinition>> {
        if let Some(agent) = self.lock().get(settings) {
            return Ok(Arc::clone(agent));
        }

        let tools = registry.resolve(settings.enabled_tools.iter().map(String::as_str))?;
        let agent = Arc::new(build_agent(
            settings.name.clone(),
            settings.instructions.clone(),
            settings.model.clone(),
            tools,
        )?);
        debug!(agent = %settings.name, model = %settings.model, "built agent definition");

        let mut entries = self.lock();
        let cached = entries
            .entry(settings.clone())
            .or_insert_with(|| Arc::clone(&agent));
        Ok(Arc::clone(cached))
    }

    /// Drop the definition for `settings`, if cached.
    pub fn invalidate(&self, settings: &AgentSettings) -> bool {
        self.lock().remove(settings).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
