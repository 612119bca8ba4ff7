//! Demo agents
//!
//! Closure-backed agents that let the binary run without a model backend.

use agent_runtime::builtin::FnAgent;
use agent_runtime::{Agent, RuntimeError, Task};
use serde_json::{json, Value};
use std::sync::Arc;

/// Longest summary produced for plain text input
const SUMMARY_CHARS: usize = 160;

pub fn agents() -> Vec<Arc<dyn Agent>> {
    vec![echo(), summarize(), analyze()]
}

fn echo() -> Arc<dyn Agent> {
    Arc::new(
        FnAgent::new("echo", ["echo", "batch_processing"], |task: Task| async move {
            Ok(task.input)
        })
        .with_description("Returns the task input unchanged"),
    )
}

fn summarize() -> Arc<dyn Agent> {
    Arc::new(
        FnAgent::new("summarize", ["summarize", "chat"], |task: Task| async move {
            if let Some(history) = task.message_history() {
                return Ok(json!(format!(
                    "{} message(s), last: {}",
                    history.len(),
                    history.last().map(message_text).unwrap_or_default()
                )));
            }
            match &task.input {
                Value::String(text) => Ok(json!(truncate(text, SUMMARY_CHARS))),
                Value::Null => Err(RuntimeError::invalid_input("nothing to summarize")),
                other => Ok(json!(truncate(&other.to_string(), SUMMARY_CHARS))),
            }
        })
        .with_description("Shortens text or message history")
        .with_priority(1),
    )
}

fn analyze() -> Arc<dyn Agent> {
    Arc::new(
        FnAgent::new("analyze", ["analyze", "data_extraction"], |task: Task| async move {
            let text = match &task.input {
                Value::String(text) => text.clone(),
                Value::Array(items) => items.iter().map(message_text).collect::<Vec<_>>().join(" "),
                other => other.to_string(),
            };
            Ok(json!({
                "characters": text.chars().count(),
                "words": text.split_whitespace().count(),
                "lines": text.lines().count(),
            }))
        })
        .with_description("Counts characters, words and lines"),
    )
}

/// The `content` of a chat message, or the value itself as text
fn message_text(message: &Value) -> String {
    match message.get("content").unwrap_or(message) {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
