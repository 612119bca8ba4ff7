//! Closure-backed agent

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::to_tags;
use crate::{Agent, Result, Task};

type TaskHandler = dyn Fn(Task) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Agent whose `execute` is a host-supplied async closure
///
/// # Example
///
/// ```
/// use agent_runtime::{builtin::FnAgent, Agent, Task};
/// use serde_json::json;
///
/// let upper = FnAgent::new("upper", ["uppercase"], |task: Task| async move {
///     let text = task.input.as_str().unwrap_or_default().to_uppercase();
///     Ok(json!(text))
/// });
/// assert_eq!(upper.can_handle(&Task::new("uppercase", json!("hi"))), 1.0);
/// ```
#[derive(Clone)]
pub struct FnAgent {
    id: String,
    name: Option<String>,
    description: String,
    capabilities: Vec<String>,
    priority: i32,
    handler: Arc<TaskHandler>,
}

impl FnAgent {
    pub fn new<I, S, F, Fut>(id: impl Into<String>, capabilities: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: None,
            description: String::new(),
            capabilities: to_tags(capabilities),
            priority: 0,
            handler: Arc::new(move |task| Box::pin(handler(task))),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl Agent for FnAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
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
        (self.handler)(task.clone()).await
    }
}
