//! Tool-calling agent

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::to_tags;
use crate::{Agent, Result, RuntimeError, Task, ToolExecutor};

/// Agent that forwards tasks to a [`ToolExecutor`]
///
/// A task input of the form `{"tool": NAME, "params": {...}}` calls `NAME`
/// with `params`. Any other input calls the tool named by the task type and
/// passes the whole input as parameters.
pub struct ToolAgent {
    id: String,
    description: String,
    capabilities: Vec<String>,
    priority: i32,
    executor: Arc<dyn ToolExecutor>,
}

impl ToolAgent {
    pub fn new<I, S>(id: impl Into<String>, capabilities: I, executor: Arc<dyn ToolExecutor>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            description: String::new(),
            capabilities: to_tags(capabilities),
            priority: 0,
            executor,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn resolve_call(task: &Task) -> Result<(String, Value)> {
        let (tool, params) = match task.input.get("tool").and_then(Value::as_str) {
            Some(tool) => (
                tool.to_string(),
                task.input.get("params").cloned().unwrap_or(Value::Null),
            ),
            None => (task.task_type.clone(), task.input.clone()),
        };

        if tool.is_empty() {
            return Err(RuntimeError::invalid_input(format!(
                "task {} does not name a tool",
                task.id
            )));
        }
        Ok((tool, params))
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn execute(&self, task: &Task) -> Result<Value> {
        let (tool, params) = Self::resolve_call(task)?;
        tracing::debug!("Agent {} calling tool {}", self.id, tool);
        self.executor.call(&tool, params, &task.context).await
    }
}
