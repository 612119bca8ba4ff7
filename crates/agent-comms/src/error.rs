//! Error types for agent communication

use agent_core::AgentError;

/// Result type for communication operations
pub type Result<T> = std::result::Result<T, CommsError>;

/// Errors in agent communication
#[derive(Debug, thiserror::Error)]
pub enum CommsError {
    /// Message addressed to an agent that is not registered
    #[error("Target agent not found: {0}")]
    TargetNotFound(String),

    /// The target's message handler failed
    #[error("Message delivery to {agent_id} failed: {message}")]
    DeliveryFailed { agent_id: String, message: String },

    /// Generic error from agent-core
    #[error(transparent)]
    CoreError(#[from] AgentError),
}

impl CommsError {
    /// Create a delivery failed error
    pub fn delivery_failed<S: Into<String>, M: ToString>(agent_id: S, cause: M) -> Self {
        Self::DeliveryFailed {
            agent_id: agent_id.into(),
            message: cause.to_string(),
        }
    }
}
