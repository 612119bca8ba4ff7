//! Single- vs multi-agent decision
//!
//! Three detectors run in a fixed order and the first positive one wins:
//! context pollution, then parallelization, then specialization.

use agent_core::DecisionSettings;
use agent_runtime::Task;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::SkillRegistry;

/// Which multi-agent strategy a task calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Too much context for one agent: split it
    ContextPollution,
    /// Independent pieces of work: fan out
    Parallelization,
    /// Several domains involved: run specialized skills
    Specialization,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextPollution => "context_pollution",
            Self::Parallelization => "parallelization",
            Self::Specialization => "specialization",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`DecisionEngine::should_use_multi_agent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub use_multi_agent: bool,
    pub scenario: Option<Scenario>,
    /// The scenario name, or `single_agent`
    pub reason: String,
    /// Which signal fired and the measured values
    pub details: Value,
}

impl Decision {
    pub const SINGLE_AGENT: &'static str = "single_agent";

    fn multi(scenario: Scenario, details: Value) -> Self {
        Self {
            use_multi_agent: true,
            scenario: Some(scenario),
            reason: scenario.as_str().to_string(),
            details,
        }
    }

    fn single() -> Self {
        Self {
            use_multi_agent: false,
            scenario: None,
            reason: Self::SINGLE_AGENT.to_string(),
            details: Value::Null,
        }
    }
}

/// Classifies tasks for the orchestrator
pub struct DecisionEngine {
    settings: DecisionSettings,
    skills: Option<Arc<dyn SkillRegistry>>,
}

impl DecisionEngine {
    pub fn new(settings: DecisionSettings, skills: Option<Arc<dyn SkillRegistry>>) -> Self {
        Self { settings, skills }
    }

    pub fn settings(&self) -> &DecisionSettings {
        &self.settings
    }

    pub async fn should_use_multi_agent(&self, task: &Task) -> Decision {
        if let Some(details) = self.detect_context_pollution(task) {
            return Decision::multi(Scenario::ContextPollution, details);
        }
        if let Some(details) = self.detect_parallelization(task) {
            return Decision::multi(Scenario::Parallelization, details);
        }
        if let Some(details) = self.detect_specialization(task).await {
            return Decision::multi(Scenario::Specialization, details);
        }
        Decision::single()
    }

    /// Oversized context or an overlong message history
    pub fn detect_context_pollution(&self, task: &Task) -> Option<Value> {
        let context_bytes = serde_json::to_string(&task.context)
            .map(|s| s.len())
            .unwrap_or(0);
        let size = context_bytes + task.description_text().len();
        if size > self.settings.context_threshold_bytes {
            return Some(json!({
                "signal": "context_size",
                "bytes": size,
                "threshold": self.settings.context_threshold_bytes,
            }));
        }

        let history_len = task.message_history().map_or(0, Vec::len);
        if history_len > self.settings.max_message_history {
            return Some(json!({
                "signal": "message_history",
                "messages": history_len,
                "threshold": self.settings.max_message_history,
            }));
        }
        None
    }

    /// Enough independent subtasks, a parallel task type or a large input list
    pub fn detect_parallelization(&self, task: &Task) -> Option<Value> {
        let min = self.settings.min_parallel_tasks;

        let independent = task.independent_subtasks().count();
        if independent >= min {
            return Some(json!({
                "signal": "independent_subtasks",
                "count": independent,
                "threshold": min,
            }));
        }

        if self.settings.parallel_task_types.contains(&task.task_type) {
            return Some(json!({
                "signal": "task_type",
                "taskType": task.task_type,
            }));
        }

        if let Some(items) = task.input.as_array() {
            if items.len() >= min {
                return Some(json!({
                    "signal": "input_items",
                    "count": items.len(),
                    "threshold": min,
                }));
            }
        }
        None
    }

    /// Several strong skill matches, many required tools or a cross-domain type
    ///
    /// A failing skill registry counts as no match.
    pub async fn detect_specialization(&self, task: &Task) -> Option<Value> {
        if let Some(skills) = &self.skills {
            match skills.find_skills_for_task(task).await {
                Ok(found) => {
                    let strong: Vec<&str> = found
                        .iter()
                        .filter(|s| s.score >= self.settings.min_skill_score)
                        .map(|s| s.skill.name())
                        .collect();
                    if strong.len() >= 2 {
                        return Some(json!({
                            "signal": "skill_matches",
                            "skills": strong,
                            "minScore": self.settings.min_skill_score,
                        }));
                    }
                }
                Err(e) => {
                    tracing::warn!("Skill lookup for task {} failed: {}", task.id, e);
                }
            }
        }

        if task.required_tools.len() >= 3 {
            return Some(json!({
                "signal": "required_tools",
                "tools": task.required_tools,
            }));
        }

        if self.settings.cross_domain_task_types.contains(&task.task_type) {
            return Some(json!({
                "signal": "task_type",
                "taskType": task.task_type,
            }));
        }
        None
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("settings", &self.settings)
            .field("skills", &self.skills.is_some())
            .finish()
    }
}
