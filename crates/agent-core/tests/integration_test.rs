//! Integration tests for the shared core
//!
//! Config loading, error conversion and history behaviour working together.

use agent_core::{
    config::{load_config, load_config_or_default, OrchestratorConfig},
    error::{AgentError, Result},
    history::BoundedHistory,
    logging::LogConfig,
};
use std::io::Write;

#[test]
fn test_config_loading_falls_back() {
    let config = load_config_or_default("nonexistent.toml");
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.dispatcher.task_timeout_ms, 60_000);
}

#[test]
fn test_json_config_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{ "logging": {{ "level": "debug", "json": true }}, "dispatcher": {{ "max_history": 5 }} }}"#
    )
    .unwrap();

    let config = load_config(file.path()).expect("config should load");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert_eq!(config.dispatcher.max_history, 5);
    assert_eq!(config.dispatcher.max_messages, 100);
}

#[test]
fn test_config_serialization_roundtrip() {
    let config = OrchestratorConfig::default();
    let json = serde_json::to_string(&config).expect("Failed to serialize");
    let deserialized: OrchestratorConfig =
        serde_json::from_str(&json).expect("Failed to deserialize");

    assert_eq!(
        config.decision.cross_domain_task_types,
        deserialized.decision.cross_domain_task_types
    );
    assert_eq!(config.team.max_parallel_agents, deserialized.team.max_parallel_agents);
}

#[test]
fn test_error_handling() {
    let result: Result<()> = Err(AgentError::config("test error"));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("test error"));
}

#[test]
fn test_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
    assert!(matches!(AgentError::from(io_err), AgentError::Io(_)));
}

#[test]
fn test_logging_config_from_file_section() {
    let config = OrchestratorConfig::default();
    let log_config = LogConfig::from(&config.logging);
    assert_eq!(log_config.level, "info");
    assert!(!log_config.json);
}

#[test]
fn test_history_sized_from_config() {
    let config = OrchestratorConfig::default();
    let history = BoundedHistory::new(config.dispatcher.max_history);
    for i in 0..250 {
        history.push(i);
    }
    assert_eq!(history.len(), 100);
    assert_eq!(history.recent(1), vec![249]);
    assert_eq!(history.snapshot()[0], 150);
}
