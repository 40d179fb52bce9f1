//! Registry of agent factories for building agents from configuration.

use super::Agent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Configuration handed to an agent factory.
pub type AgentConfig = serde_json::Map<String, serde_json::Value>;

/// Factory function type for creating agents.
pub type AgentFactory = Arc<dyn Fn(&AgentConfig) -> anyhow::Result<Arc<dyn Agent>> + Send + Sync>;

/// Registry mapping agent kind names to factories.
#[derive(Default)]
pub struct AgentRegistry {
    factories: RwLock<HashMap<String, AgentFactory>>,
}

impl AgentRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a kind name, replacing any previous one.
    pub fn register<F>(&self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&AgentConfig) -> anyhow::Result<Arc<dyn Agent>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        tracing::debug!(agent_kind = %kind, "Registered agent factory");
        self.factories.write().insert(kind, Arc::new(factory));
    }

    /// Builds an agent of the given kind.
    ///
    /// Returns `None` if no factory is registered for `kind`.
    pub fn build(&self, kind: &str, config: &AgentConfig) -> Option<anyhow::Result<Arc<dyn Agent>>> {
        // Release the lock before running user code.
        let factory = self.factories.read().get(kind).cloned()?;
        Some(factory(config))
    }

    /// Checks if a kind is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.read().contains_key(kind)
    }

    /// Lists registered kinds in sorted order.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.factories.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
