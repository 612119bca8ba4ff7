//! Error types for agent coordination

use agent_comms::CommsError;
use agent_core::AgentError;
use agent_runtime::RuntimeError;
use std::time::Duration;

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Errors in agent coordination
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    /// No registered agent scored above zero for the task
    #[error("No capable agent for task type '{0}'")]
    NoCapableAgent(String),

    /// Dispatched execution exceeded the deadline
    #[error("Agent {agent_id} timed out after {timeout:?}")]
    AgentTimeout { agent_id: String, timeout: Duration },

    /// The agent's own logic failed (after retries)
    #[error("Agent {agent_id} execution failed: {source}")]
    AgentExecutionFailed {
        agent_id: String,
        #[source]
        source: RuntimeError,
    },

    /// Message addressed to an unregistered agent
    #[error("Target agent not found: {0}")]
    TargetNotFound(String),

    /// Every skill-based sub-execution failed
    #[error("All {0} specialized agents failed")]
    AllSpecializedAgentsFailed(usize),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Team {team_id} is full ({max_agents} agents)")]
    TeamFull { team_id: String, max_agents: usize },

    /// Specialization requested without a skill registry
    #[error("Skill registry unavailable")]
    SkillRegistryUnavailable,

    /// Communication error
    #[error("Communication error: {0}")]
    Communication(CommsError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Generic error from agent-core
    #[error(transparent)]
    CoreError(#[from] AgentError),
}

impl CoordinationError {
    /// Wrap an agent failure with the id of the agent that raised it
    pub fn execution_failed<S: Into<String>>(agent_id: S, source: RuntimeError) -> Self {
        Self::AgentExecutionFailed {
            agent_id: agent_id.into(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AgentTimeout { .. })
    }
}

impl From<CommsError> for CoordinationError {
    fn from(err: CommsError) -> Self {
        match err {
            CommsError::TargetNotFound(id) => Self::TargetNotFound(id),
            other => Self::Communication(other),
        }
    }
}
