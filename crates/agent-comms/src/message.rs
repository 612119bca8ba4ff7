//! Agent messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Point-to-point message
    Send,

    /// Delivered to every agent except the sender
    Broadcast,
}

/// Message between agents, as recorded in the message log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,

    pub msg_type: MessageType,

    pub from: String,

    /// Target agent ID (None for broadcast)
    pub to: Option<String>,

    pub content: Value,

    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    /// Create a point-to-point message
    pub fn new(from: impl Into<String>, to: impl Into<String>, content: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: MessageType::Send,
            from: from.into(),
            to: Some(to.into()),
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a broadcast message
    pub fn broadcast(from: impl Into<String>, content: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: MessageType::Broadcast,
            from: from.into(),
            to: None,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Whether `agent_id` sent or was meant to receive this message
    pub fn involves(&self, agent_id: &str) -> bool {
        if self.from == agent_id {
            return true;
        }
        match &self.to {
            Some(to) => to == agent_id,
            None => true,
        }
    }
}

/// Outcome of delivering a broadcast to one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub agent_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Delivery {
    pub fn ok(agent_id: impl Into<String>, response: Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(agent_id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: false,
            response: None,
            error: Some(error.to_string()),
        }
    }
}
