//! Agent Core
//!
//! Shared building blocks for the orchestration crates: the base error
//! type, layered configuration, logging setup and the capped history
//! buffer used for execution records and message logs.

pub mod config;
pub mod error;
pub mod history;
pub mod logging;

// Re-export commonly used types
pub use config::{
    load_config, load_config_or_default, DecisionSettings, DispatcherSettings, LoggingConfig,
    OrchestratorConfig, RetrySettings, TeamSettings,
};
pub use error::{AgentError, Result};
pub use history::BoundedHistory;
pub use logging::init_logging;
