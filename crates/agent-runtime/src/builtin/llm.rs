//! Model-backed agent

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::to_tags;
use crate::task::context_keys;
use crate::{Agent, ChatMessage, GenerateOptions, ModelBackend, Result, RuntimeError, Task};

/// Agent that answers tasks by calling a model backend
///
/// The conversation sent to the backend is `context.messageHistory`,
/// then the previous chain result (if any), then the task itself.
pub struct LlmAgent {
    id: String,
    name: Option<String>,
    description: String,
    capabilities: Vec<String>,
    priority: i32,
    system_prompt: String,
    options: GenerateOptions,
    backend: Arc<dyn ModelBackend>,
}

impl LlmAgent {
    pub fn builder(id: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(id)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn build_messages(&self, task: &Task) -> Result<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = task
            .message_history()
            .map(|history| history.iter().map(ChatMessage::from_history_entry).collect())
            .unwrap_or_default();

        if let Some(previous) = task.context.get(context_keys::PREVIOUS_RESULT) {
            messages.push(ChatMessage::user(format!(
                "Result of the previous step:\n{}",
                render(previous)
            )));
        }

        let prompt = task_prompt(task);
        if prompt.is_empty() && messages.is_empty() {
            return Err(RuntimeError::invalid_input(format!(
                "task {} has no description, input or history",
                task.id
            )));
        }
        if !prompt.is_empty() {
            messages.push(ChatMessage::user(prompt));
        }

        Ok(messages)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn task_prompt(task: &Task) -> String {
    let input = match &task.input {
        Value::Null => String::new(),
        other => render(other),
    };
    match (&task.description, input.is_empty()) {
        (Some(description), true) => description.clone(),
        (Some(description), false) => format!("{}\n\n{}", description, input),
        (None, _) => input,
    }
}

#[async_trait]
impl Agent for LlmAgent {
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
        let messages = self.build_messages(task)?;
        tracing::debug!(
            "Agent {} sending {} message(s) to backend {}",
            self.id,
            messages.len(),
            self.backend.name()
        );

        let text = self
            .backend
            .generate(messages, &self.system_prompt, &self.options)
            .await?;
        Ok(Value::String(text))
    }
}

/// Builder for constructing an [`LlmAgent`]
pub struct LlmAgentBuilder {
    id: String,
    name: Option<String>,
    description: String,
    capabilities: Vec<String>,
    priority: i32,
    system_prompt: String,
    options: GenerateOptions,
    backend: Option<Arc<dyn ModelBackend>>,
}

impl LlmAgentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: String::new(),
            capabilities: Vec::new(),
            priority: 0,
            system_prompt: "You are a helpful AI assistant.".to_string(),
            options: GenerateOptions::default(),
            backend: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = to_tags(capabilities);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend<B: ModelBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn shared_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let backend = self
            .backend
            .ok_or_else(|| RuntimeError::config("Model backend not set"))?;

        if self.capabilities.is_empty() {
            tracing::warn!("LLM agent {} has no capabilities and will never be selected", self.id);
        }

        Ok(LlmAgent {
            id: self.id,
            name: self.name,
            description: self.description,
            capabilities: self.capabilities,
            priority: self.priority,
            system_prompt: self.system_prompt,
            options: self.options,
            backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records what it was asked and answers with the message count
    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    }

    #[async_trait]
    impl ModelBackend for Arc<RecordingBackend> {
        async fn generate(
            &self,
            messages: Vec<ChatMessage>,
            system_prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String> {
            let count = messages.len();
            self.seen.lock().push((messages, system_prompt.to_string()));
            Ok(format!("{} messages", count))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ModelBackend for FailingBackend {
        async fn generate(
            &self,
            _messages: Vec<ChatMessage>,
            _system_prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String> {
            Err(RuntimeError::model("rate limited"))
        }
    }

    #[test]
    fn test_builder_requires_backend() {
        let result = LlmAgent::builder("writer").capabilities(["writing"]).build();
        assert!(matches!(result, Err(RuntimeError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_conversation_layout() {
        let backend = Arc::new(RecordingBackend::default());
        let agent = LlmAgent::builder("writer")
            .capabilities(["writing"])
            .system_prompt("Be brief.")
            .backend(backend.clone())
            .build()
            .unwrap();

        let task = Task::new("writing", json!("Draft a haiku"))
            .with_message_history(vec![
                json!({"role": "user", "content": "hello"}),
                json!({"role": "assistant", "content": "hi there"}),
            ])
            .with_context("previousResult", json!({"outline": [1, 2]}));

        let result = agent.execute(&task).await.unwrap();
        assert_eq!(result, json!("4 messages"));

        let seen = backend.seen.lock();
        let (messages, system_prompt) = &seen[0];
        assert_eq!(system_prompt, "Be brief.");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert!(messages[2].content.contains("outline"));
        assert_eq!(messages[3].content, "Draft a haiku");
    }

    #[tokio::test]
    async fn test_description_and_input_are_combined() {
        let backend = Arc::new(RecordingBackend::default());
        let agent = LlmAgent::builder("a")
            .capabilities(["x"])
            .backend(backend.clone())
            .build()
            .unwrap();

        let task = Task::new("x", json!({"n": 1})).with_description("Explain");
        agent.execute(&task).await.unwrap();

        let seen = backend.seen.lock();
        assert!(seen[0].0[0].content.starts_with("Explain\n\n"));
    }

    #[tokio::test]
    async fn test_empty_task_is_rejected() {
        let agent = LlmAgent::builder("a")
            .capabilities(["x"])
            .backend(FailingBackend)
            .build()
            .unwrap();

        let err = agent.execute(&Task::new("x", Value::Null)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let agent = LlmAgent::builder("a")
            .capabilities(["x"])
            .backend(FailingBackend)
            .build()
            .unwrap();

        let err = agent.execute(&Task::new("x", json!("go"))).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Model(_)));
    }
}
