//! Agent contract
//!
//! Every agent declares capability tags and implements `execute`. The
//! orchestration core scores agents through `can_handle`, which by default
//! applies [`capability_score`] to the task type.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Result, Task};

/// Score for an exact capability match
pub const EXACT_MATCH: f64 = 1.0;

/// Score when the task type and a capability contain one another
pub const PARTIAL_MATCH: f64 = 0.5;

/// Score a task type against a capability set
///
/// Returns 1.0 for an exact tag, 0.5 when the type is a substring of a tag
/// or a tag is a substring of the type, 0.0 otherwise (including an empty
/// type). An exact match anywhere in the set wins over partial matches.
pub fn capability_score<S: AsRef<str>>(capabilities: &[S], task_type: &str) -> f64 {
    if task_type.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    for capability in capabilities.iter().map(AsRef::as_ref) {
        if capability.is_empty() {
            continue;
        }
        if capability == task_type {
            return EXACT_MATCH;
        }
        if capability.contains(task_type) || task_type.contains(capability) {
            score = PARTIAL_MATCH;
        }
    }
    score
}

/// A capability-tagged unit of work
///
/// Implementations are registered with the dispatcher behind `Arc<dyn Agent>`
/// and wrapped in a `ManagedAgent`, which owns run-state, statistics and the
/// retry loop. `execute` is the only required behaviour.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique, immutable identifier chosen by the registering caller
    fn id(&self) -> &str;

    /// Display name (defaults to the id)
    fn name(&self) -> &str {
        self.id()
    }

    fn description(&self) -> &str {
        ""
    }

    /// Capability tags this agent claims to handle
    fn capabilities(&self) -> &[String];

    /// Tie-break hint; not used by the selection scan
    fn priority(&self) -> i32 {
        0
    }

    /// How well this agent fits the task, in `[0, 1]`
    fn can_handle(&self, task: &Task) -> f64 {
        capability_score(self.capabilities(), &task.task_type)
    }

    /// Perform the task
    async fn execute(&self, task: &Task) -> Result<Value>;

    /// React to a message from a peer; acknowledges receipt by default
    async fn receive_message(&self, payload: &Value, from: &str) -> Result<Value> {
        tracing::debug!("Agent {} received message from {}: {}", self.id(), from, payload);
        Ok(json!({
            "acknowledged": true,
            "agentId": self.id(),
            "from": from,
        }))
    }

    /// Release external handles when unregistered. Must not perform I/O.
    fn shutdown(&self) {}
}
