//! Configuration for the orchestration core
//!
//! Configuration is layered:
//! - Built-in defaults (every field has one)
//! - A configuration file (TOML, JSON or YAML, chosen by extension)
//! - `ORCHESTRATOR__SECTION__FIELD` environment variables

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ORCHESTRATOR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry behaviour of every managed agent
    #[serde(default)]
    pub agent: RetrySettings,

    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    #[serde(default)]
    pub decision: DecisionSettings,

    #[serde(default)]
    pub team: TeamSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Retry policy applied around `Agent::execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per call (not additional retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay; attempt `n` waits `retry_delay_ms * n` before the next one
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl RetrySettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Dispatcher limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Hard deadline for a single dispatched task
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    /// Execution record capacity
    #[serde(default = "default_history_cap")]
    pub max_history: usize,

    /// Message log capacity
    #[serde(default = "default_history_cap")]
    pub max_messages: usize,

    /// Default concurrency ceiling for parallel batches
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Buffered events per subscriber before lagging
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl DispatcherSettings {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            task_timeout_ms: default_task_timeout_ms(),
            max_history: default_history_cap(),
            max_messages: default_history_cap(),
            max_concurrency: default_concurrency(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Thresholds used to decide between single- and multi-agent execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSettings {
    /// Serialized context + description size that counts as polluted
    #[serde(default = "default_context_threshold")]
    pub context_threshold_bytes: usize,

    /// `context.messageHistory` longer than this counts as polluted
    #[serde(default = "default_max_message_history")]
    pub max_message_history: usize,

    #[serde(default = "default_min_parallel_tasks")]
    pub min_parallel_tasks: usize,

    /// Minimum skill score that counts as a specialization match
    #[serde(default = "default_min_skill_score")]
    pub min_skill_score: f64,

    /// Task types that are parallel by nature
    #[serde(default = "default_parallel_task_types")]
    pub parallel_task_types: Vec<String>,

    /// Task types that span several domains
    #[serde(default = "default_cross_domain_task_types")]
    pub cross_domain_task_types: Vec<String>,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            context_threshold_bytes: default_context_threshold(),
            max_message_history: default_max_message_history(),
            min_parallel_tasks: default_min_parallel_tasks(),
            min_skill_score: default_min_skill_score(),
            parallel_task_types: default_parallel_task_types(),
            cross_domain_task_types: default_cross_domain_task_types(),
        }
    }
}

/// Team sizing for the multi-agent strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSettings {
    /// Concurrency ceiling inside one strategy
    #[serde(default = "default_concurrency")]
    pub max_parallel_agents: usize,

    /// Upper bound on enrolled members
    #[serde(default = "default_max_team_agents")]
    pub max_team_agents: usize,

    /// Messages per divide-context chunk
    #[serde(default = "default_context_chunk_size")]
    pub context_chunk_size: usize,

    #[serde(default = "default_max_team_agents")]
    pub max_specialized_skills: usize,
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            max_parallel_agents: default_concurrency(),
            max_team_agents: default_max_team_agents(),
            context_chunk_size: default_context_chunk_size(),
            max_specialized_skills: default_max_team_agents(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_task_timeout_ms() -> u64 {
    60_000
}

fn default_history_cap() -> usize {
    100
}

fn default_concurrency() -> usize {
    3
}

fn default_event_capacity() -> usize {
    1000
}

fn default_context_threshold() -> usize {
    32_000
}

fn default_max_message_history() -> usize {
    50
}

fn default_min_parallel_tasks() -> usize {
    3
}

fn default_min_skill_score() -> f64 {
    0.6
}

fn default_parallel_task_types() -> Vec<String> {
    [
        "batch_processing",
        "multi_file_analysis",
        "parallel_search",
        "bulk_translation",
        "data_extraction",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_cross_domain_task_types() -> Vec<String> {
    [
        "full_stack_development",
        "research_and_report",
        "code_review_and_testing",
        "data_analysis_and_visualization",
        "security_audit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_team_agents() -> usize {
    5
}

fn default_context_chunk_size() -> usize {
    10
}

/// Load configuration from a file, with environment overrides
///
/// Supports TOML, JSON, and YAML formats based on file extension.
///
/// # Example
///
/// ```no_run
/// use agent_core::config::load_config;
///
/// let config = load_config("orchestrator.toml").unwrap();
/// println!("Timeout: {:?}", config.dispatcher.task_timeout());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<OrchestratorConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AgentError::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: OrchestratorConfig = settings.try_deserialize()?;

    tracing::info!("Configuration loaded from {}", path.display());

    Ok(config)
}

/// Load configuration, falling back to defaults when the file is missing or invalid
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> OrchestratorConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            OrchestratorConfig::default()
        }
    }
}
