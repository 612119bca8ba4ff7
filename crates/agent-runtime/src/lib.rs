//! Agent Runtime
//!
//! The agent contract, the task model and the retrying execution wrapper
//! every registered agent runs inside.
//!
//! # Example
//!
//! ```
//! use agent_runtime::{builtin::FnAgent, ManagedAgent, RetryPolicy, Task};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> agent_runtime::Result<()> {
//!     let echo = FnAgent::new("echo", ["echo"], |task: Task| async move { Ok(task.input) });
//!     let managed = ManagedAgent::new(Arc::new(echo), RetryPolicy::no_retry());
//!
//!     let result = managed.execute_with_retry(&Task::new("echo", json!("hi"))).await?;
//!     assert_eq!(result, json!("hi"));
//!     assert_eq!(managed.stats().successful_executions, 1);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod backend;
pub mod builtin;
pub mod error;
pub mod managed;
pub mod task;

// Re-exports
pub use agent::{capability_score, Agent, EXACT_MATCH, PARTIAL_MATCH};
pub use backend::{ChatMessage, GenerateOptions, MessageRole, ModelBackend, ToolExecutor};
pub use error::{Result, RuntimeError};
pub use managed::{AgentInfo, AgentState, AgentStats, ManagedAgent, RetryPolicy};
pub use task::{context_keys, MergeStrategy, Task, TaskSummary};
