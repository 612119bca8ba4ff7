//! Task model
//!
//! A task is a typed, opaque unit of work. `task_type` is the only field the
//! core interprets for routing; `input` and `context` pass through to agents
//! untouched apart from the well-known context keys below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context keys read or written by the orchestration core
pub mod context_keys {
    /// Conversation history (array of messages)
    pub const MESSAGE_HISTORY: &str = "messageHistory";
    /// Result of the previous step in a chain
    pub const PREVIOUS_RESULT: &str = "previousResult";
    /// Position of the task inside its chain
    pub const CHAIN_INDEX: &str = "chainIndex";
    pub const CHUNK_INDEX: &str = "chunkIndex";
    pub const TOTAL_CHUNKS: &str = "totalChunks";
    pub const TEAM_ID: &str = "teamId";
}

/// How partial results of a team are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Join results in input order
    Concatenate,
    /// Reduce results with the configured aggregator
    Aggregate,
    /// Pick the result most members agree on
    Vote,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Concatenate => "concatenate",
            Self::Aggregate => "aggregate",
            Self::Vote => "vote",
        };
        f.write_str(name)
    }
}

fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A unit of work routed to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default = "new_task_id")]
    pub id: String,

    /// Discriminator matched against agent capabilities
    #[serde(rename = "type", default)]
    pub task_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub input: Value,

    #[serde(default)]
    pub context: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,

    /// Ids of sibling subtasks that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tools: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,
}

impl Task {
    /// Create a task of the given type
    pub fn new(task_type: impl Into<String>, input: Value) -> Self {
        Self {
            id: new_task_id(),
            task_type: task_type.into(),
            description: None,
            input,
            context: Map::new(),
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            required_tools: Vec::new(),
            merge_strategy: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a single context entry
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_context_map(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_message_history(self, messages: Vec<Value>) -> Self {
        self.with_context(context_keys::MESSAGE_HISTORY, Value::Array(messages))
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Task>) -> Self {
        self.subtasks = subtasks;
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = Some(strategy);
        self
    }

    /// `context.messageHistory`, when present and an array
    pub fn message_history(&self) -> Option<&Vec<Value>> {
        self.context
            .get(context_keys::MESSAGE_HISTORY)
            .and_then(Value::as_array)
    }

    /// Subtasks that declare no dependencies
    pub fn independent_subtasks(&self) -> impl Iterator<Item = &Task> {
        self.subtasks.iter().filter(|t| t.dependencies.is_empty())
    }

    /// Text describing the task: the description, or a string input
    pub fn description_text(&self) -> &str {
        match (&self.description, &self.input) {
            (Some(description), _) => description,
            (None, Value::String(text)) => text,
            _ => "",
        }
    }

    /// Copy of this task with a fresh id and the given context entries merged in
    pub fn derive(&self, entries: impl IntoIterator<Item = (String, Value)>) -> Task {
        let mut derived = self.clone();
        derived.id = new_task_id();
        derived.subtasks.clear();
        derived.context.extend(entries);
        derived
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            task_type: self.task_type.clone(),
            description: self.description.clone(),
        }
    }
}

/// Lightweight identification of a task for logs and records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub task_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
