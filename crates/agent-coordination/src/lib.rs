//! Agent coordination and orchestration
//!
//! Routing tasks to capability-matched agents, deciding when a task needs
//! more than one agent, and running the multi-agent strategies through
//! short-lived teams.
//!
//! # Example
//!
//! ```
//! use agent_coordination::Orchestrator;
//! use agent_runtime::{builtin::FnAgent, Task};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> agent_coordination::Result<()> {
//!     let orchestrator = Orchestrator::builder().build();
//!     orchestrator.register_agent(Arc::new(FnAgent::new("echo", ["echo"], |task: Task| async move {
//!         Ok(task.input)
//!     })));
//!
//!     let outcome = orchestrator.execute(&Task::new("echo", json!("hello"))).await?;
//!     assert_eq!(outcome.result, json!("hello"));
//!     Ok(())
//! }
//! ```

pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod merge;
pub mod orchestrator;
pub mod skills;
pub mod strategies;
pub mod team;

// Re-exports
pub use decision::{Decision, DecisionEngine, Scenario};
pub use dispatcher::{AgentUsage, CapableAgent, Dispatcher, DispatcherStats, ExecutionRecord};
pub use error::{CoordinationError, Result};
pub use executor::{run_bounded, ParallelOptions, Slot, TaskOutcome};
pub use merge::{Aggregator, DefaultAggregator};
pub use orchestrator::{OrchestrationResult, Orchestrator, OrchestratorBuilder};
pub use skills::{ScoredSkill, Skill, SkillRegistry, StaticSkillRegistry};
pub use team::{Team, TeamCoordinator, TeamGuard, TeamMember};
