//! Agent registry
//!
//! Keeps agents in registration order so that capability ties resolve to
//! the earliest-registered agent.

use agent_runtime::ManagedAgent;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Registration-ordered map from agent id to agent
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<RwLock<IndexMap<String, Arc<ManagedAgent>>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent, returning the entry it replaced
    ///
    /// A replaced entry keeps its original position in the scan order.
    pub fn register(&self, agent: Arc<ManagedAgent>) -> Option<Arc<ManagedAgent>> {
        let id = agent.id().to_string();
        let previous = self.agents.write().insert(id.clone(), agent);

        if previous.is_some() {
            tracing::warn!("Agent {} was already registered; replacing it", id);
        } else {
            tracing::debug!("Registered agent: {}", id);
        }
        previous
    }

    /// Remove an agent, preserving the order of the rest
    pub fn remove(&self, id: &str) -> Option<Arc<ManagedAgent>> {
        let removed = self.agents.write().shift_remove(id);
        if removed.is_some() {
            tracing::debug!("Removed agent: {}", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<ManagedAgent>> {
        self.agents.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.read().contains_key(id)
    }

    /// Snapshot of all agents in registration order
    pub fn list(&self) -> Vec<Arc<ManagedAgent>> {
        self.agents.read().values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry").field("agents", &self.ids()).finish()
    }
}
