//! Orchestration event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cross-cutting notifications emitted by the orchestration core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    /// Agent lifecycle
    AgentRegistered {
        agent_id: String,
        capabilities: Vec<String>,
        /// An agent with the same id was replaced
        replaced: bool,
        timestamp: DateTime<Utc>,
    },

    AgentUnregistered {
        agent_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Dispatch outcomes
    TaskCompleted {
        execution_id: String,
        task_id: String,
        task_type: String,
        agent_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    TaskFailed {
        execution_id: String,
        task_id: String,
        task_type: String,
        /// None when no agent could be selected
        agent_id: Option<String>,
        error: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Inter-agent communication
    MessageSent {
        message_id: String,
        from: String,
        /// None for broadcast
        to: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Team lifecycle
    TeamCreated {
        team_id: String,
        max_agents: usize,
        timestamp: DateTime<Utc>,
    },

    TeamDestroyed {
        team_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Decision engine outcome
    StrategySelected {
        task_id: String,
        /// None for single-agent dispatch
        scenario: Option<String>,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl OrchestrationEvent {
    /// Snake-case name of the event, as it appears in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentRegistered { .. } => "agent_registered",
            Self::AgentUnregistered { .. } => "agent_unregistered",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::MessageSent { .. } => "message_sent",
            Self::TeamCreated { .. } => "team_created",
            Self::TeamDestroyed { .. } => "team_destroyed",
            Self::StrategySelected { .. } => "strategy_selected",
        }
    }

    /// The agent the event is about, if any
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::AgentRegistered { agent_id, .. }
            | Self::AgentUnregistered { agent_id, .. }
            | Self::TaskCompleted { agent_id, .. } => Some(agent_id),
            Self::TaskFailed { agent_id, .. } => agent_id.as_deref(),
            Self::MessageSent { from, .. } => Some(from),
            Self::TeamCreated { .. } | Self::TeamDestroyed { .. } | Self::StrategySelected { .. } => {
                None
            }
        }
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::AgentRegistered { timestamp, .. }
            | Self::AgentUnregistered { timestamp, .. }
            | Self::TaskCompleted { timestamp, .. }
            | Self::TaskFailed { timestamp, .. }
            | Self::MessageSent { timestamp, .. }
            | Self::TeamCreated { timestamp, .. }
            | Self::TeamDestroyed { timestamp, .. }
            | Self::StrategySelected { timestamp, .. } => timestamp,
        }
    }

    // Convenience constructors
    pub fn agent_registered(
        agent_id: impl Into<String>,
        capabilities: Vec<String>,
        replaced: bool,
    ) -> Self {
        Self::AgentRegistered {
            agent_id: agent_id.into(),
            capabilities,
            replaced,
            timestamp: Utc::now(),
        }
    }

    pub fn agent_unregistered(agent_id: impl Into<String>) -> Self {
        Self::AgentUnregistered {
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn task_completed(
        execution_id: impl Into<String>,
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        agent_id: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self::TaskCompleted {
            execution_id: execution_id.into(),
            task_id: task_id.into(),
            task_type: task_type.into(),
            agent_id: agent_id.into(),
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn task_failed(
        execution_id: impl Into<String>,
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        agent_id: Option<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self::TaskFailed {
            execution_id: execution_id.into(),
            task_id: task_id.into(),
            task_type: task_type.into(),
            agent_id,
            error: error.into(),
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn message_sent(
        message_id: impl Into<String>,
        from: impl Into<String>,
        to: Option<String>,
    ) -> Self {
        Self::MessageSent {
            message_id: message_id.into(),
            from: from.into(),
            to,
            timestamp: Utc::now(),
        }
    }

    pub fn team_created(team_id: impl Into<String>, max_agents: usize) -> Self {
        Self::TeamCreated {
            team_id: team_id.into(),
            max_agents,
            timestamp: Utc::now(),
        }
    }

    pub fn team_destroyed(team_id: impl Into<String>) -> Self {
        Self::TeamDestroyed {
            team_id: team_id.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn strategy_selected(
        task_id: impl Into<String>,
        scenario: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StrategySelected {
            task_id: task_id.into(),
            scenario,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}
