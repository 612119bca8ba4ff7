//! External collaborators agents call into
//!
//! The orchestration core does not implement a language model or a tool
//! runtime. Hosts provide them through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message sent to the model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Interpret one `messageHistory` entry
    ///
    /// Objects with `role`/`content` keep their role, plain strings become
    /// user messages, anything else is rendered as JSON text.
    pub fn from_history_entry(entry: &Value) -> Self {
        match entry {
            Value::String(text) => Self::user(text.clone()),
            Value::Object(fields) => {
                let role = fields
                    .get("role")
                    .cloned()
                    .and_then(|r| serde_json::from_value(r).ok())
                    .unwrap_or(MessageRole::User);
                let content = match fields.get("content") {
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                    None => entry.to_string(),
                };
                Self::new(role, content)
            }
            other => Self::user(other.to_string()),
        }
    }
}

/// Generation parameters forwarded to the backend untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Language model invocation backend
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Generate text for a conversation under a system prompt
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        system_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String>;

    fn name(&self) -> &str {
        "model"
    }
}

/// Generic tool/function-call executor
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call(&self, tool_name: &str, params: Value, context: &Map<String, Value>)
        -> Result<Value>;
}
