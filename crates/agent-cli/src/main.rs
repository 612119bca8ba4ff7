//! Orchestrator CLI
//!
//! Loads configuration, registers the demo agents and runs or inspects a
//! task read from a JSON file.

mod demo;

use agent_core::{
    config::load_config_or_default,
    logging::{init_logging, LogConfig},
};
use agent_coordination::Orchestrator;
use agent_runtime::Task;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Multi-agent task orchestration", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "ORCHESTRATOR_CONFIG", default_value = "orchestrator.toml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a task with the strategy the decision engine picks
    Run {
        /// JSON file holding the task
        task_file: PathBuf,
    },

    /// Show how a task would be executed without running it
    Plan {
        /// JSON file holding the task
        task_file: PathBuf,
    },

    /// List the registered agents
    Agents,

    /// Print the debug export
    Debug,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config_or_default(&cli.config);
    let mut log_config = LogConfig::from(&config.logging);
    log_config.json |= cli.json_logs;
    init_logging(log_config);

    let orchestrator = Orchestrator::new(config);
    for agent in demo::agents() {
        orchestrator.register_agent(agent);
    }

    match cli.command {
        Commands::Run { task_file } => {
            let task = read_task(&task_file)?;
            let outcome = orchestrator.execute(&task).await?;
            print_json(&serde_json::to_value(&outcome)?)?;
        }
        Commands::Plan { task_file } => {
            let task = read_task(&task_file)?;
            let decision = orchestrator.plan(&task).await;
            print_json(&serde_json::to_value(&decision)?)?;
        }
        Commands::Agents => {
            print_json(&serde_json::to_value(orchestrator.list_agents())?)?;
        }
        Commands::Debug => {
            print_json(&orchestrator.export_debug_info())?;
        }
    }

    Ok(())
}

fn read_task(path: &Path) -> Result<Task> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    let task: Task = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid task in {}", path.display()))?;
    tracing::debug!("Loaded task {} ({})", task.id, task.task_type);
    Ok(task)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_task_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "summarize", "input": "hello"}}"#).unwrap();

        let task = read_task(file.path()).unwrap();
        assert_eq!(task.task_type, "summarize");
        assert_eq!(task.input, "hello");
        assert!(!task.id.is_empty());
    }

    #[test]
    fn test_read_task_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_task(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid task"));
        assert!(read_task(Path::new("/nonexistent/task.json")).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["orchestrator", "--json-logs", "run", "task.json"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }

    #[tokio::test]
    async fn test_demo_agents_run_a_parallel_batch() {
        let orchestrator = Orchestrator::default();
        for agent in demo::agents() {
            orchestrator.register_agent(agent);
        }
        let task = Task::new("batch_processing", serde_json::json!([1, 2, 3]));
        let outcome = orchestrator.execute(&task).await.unwrap();
        // each slice is echoed back and the slices concatenate
        assert_eq!(outcome.result, serde_json::json!([1, 2, 3]));
    }
}
