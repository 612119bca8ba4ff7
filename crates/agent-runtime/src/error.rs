//! Error types for agent execution

use agent_core::AgentError;

/// Result type for agent runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised while an agent works on a task
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The agent's own logic failed
    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),

    /// Model backend error
    #[error("Model backend error: {0}")]
    Model(String),

    /// Tool executor error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Task input the agent cannot work with
    #[error("Invalid task input: {0}")]
    InvalidInput(String),

    /// Agent not configured properly
    #[error("Agent configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error from agent-core
    #[error(transparent)]
    CoreError(#[from] AgentError),
}

impl RuntimeError {
    /// Create an execution failure
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    pub fn tool<S: Into<String>>(msg: S) -> Self {
        Self::Tool(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}
