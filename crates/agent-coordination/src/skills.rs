//! Skill registry contract
//!
//! Skills are looked up per task and executed directly by the
//! specialized-agents strategy, without going through the dispatcher.

use agent_runtime::{capability_score, Task};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::Result;

/// A capability-tagged unit the specialized-agents strategy can run
#[async_trait]
pub trait Skill: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &[String];

    async fn execute(&self, task: &Task, context: &Map<String, Value>) -> agent_runtime::Result<Value>;
}

/// A skill together with how well it matches a task
#[derive(Clone)]
pub struct ScoredSkill {
    pub skill: Arc<dyn Skill>,
    pub score: f64,
}

impl std::fmt::Debug for ScoredSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoredSkill")
            .field("skill", &self.skill.name())
            .field("score", &self.score)
            .finish()
    }
}

/// Ranks skills for a task
#[async_trait]
pub trait SkillRegistry: Send + Sync {
    /// Matching skills, best first
    async fn find_skills_for_task(&self, task: &Task) -> Result<Vec<ScoredSkill>>;
}

/// In-memory registry scoring skills with the agent capability rule
#[derive(Default)]
pub struct StaticSkillRegistry {
    skills: RwLock<Vec<Arc<dyn Skill>>>,
}

impl StaticSkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, skill: Arc<dyn Skill>) {
        tracing::debug!("Registered skill: {}", skill.name());
        self.skills.write().push(skill);
    }

    pub fn len(&self) -> usize {
        self.skills.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.read().is_empty()
    }
}

#[async_trait]
impl SkillRegistry for StaticSkillRegistry {
    async fn find_skills_for_task(&self, task: &Task) -> Result<Vec<ScoredSkill>> {
        let mut matches: Vec<ScoredSkill> = self
            .skills
            .read()
            .iter()
            .map(|skill| ScoredSkill {
                skill: skill.clone(),
                score: capability_score(skill.capabilities(), &task.task_type),
            })
            .filter(|scored| scored.score > 0.0)
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }
}
