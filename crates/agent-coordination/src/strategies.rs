//! Multi-agent strategies
//!
//! Each strategy creates a scoped team, enrolls members, builds one
//! sub-task per member slot, runs them through [`run_bounded`], merges the
//! results and lets the guard destroy the team.

use agent_runtime::task::context_keys;
use agent_runtime::{MergeStrategy, Task};
use serde_json::{json, Value};
use std::time::Instant;

use crate::executor::{run_bounded, ParallelOptions, Slot};
use crate::{CoordinationError, Dispatcher, Result, SkillRegistry, TeamCoordinator};

/// A sub-task and the member it is assigned to
struct Assignment {
    agent_id: String,
    task: Task,
}

fn team_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

impl TeamCoordinator {
    /// Split `context.messageHistory` into chunks, one agent per chunk
    ///
    /// Every chunk must succeed; results are concatenated in chunk order.
    pub async fn divide_context(&self, dispatcher: &Dispatcher, task: &Task) -> Result<Value> {
        let chunk_size = self.settings().context_chunk_size.max(1);
        let chunks: Vec<Vec<Value>> = match task.message_history() {
            Some(history) if !history.is_empty() => {
                history.chunks(chunk_size).map(<[Value]>::to_vec).collect()
            }
            _ => vec![Vec::new()],
        };
        let total = chunks.len();

        let guard = self.scoped_team(team_id("ctx"), self.settings().max_team_agents);
        let team = guard.team_id().to_string();

        let members = self.enroll_capable(dispatcher, &team, task, total)?;
        let mut assignments = Vec::with_capacity(total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut entries = vec![
                (context_keys::CHUNK_INDEX.to_string(), json!(index)),
                (context_keys::TOTAL_CHUNKS.to_string(), json!(total)),
                (context_keys::TEAM_ID.to_string(), json!(team)),
            ];
            if !chunk.is_empty() {
                entries.push((context_keys::MESSAGE_HISTORY.to_string(), Value::Array(chunk)));
            }
            let chunk_task = task.derive(entries);
            let agent_id = members[index % members.len()].clone();
            self.assign_task(&team, &agent_id, &chunk_task.id)?;
            assignments.push(Assignment {
                agent_id,
                task: chunk_task,
            });
        }

        tracing::info!("Team {} processing {} context chunk(s)", team, total);
        let options = ParallelOptions::new(self.settings().max_parallel_agents).stop_on_error(true);
        let slots = run_assignments(dispatcher, assignments, options).await?;

        let results = slots.into_iter().filter_map(|slot| slot.result.ok()).collect();
        self.merge_results(&team, results, MergeStrategy::Concatenate)
    }

    /// Fan subtasks (or slices of the input list) out across the team
    ///
    /// Failed slots are left out of the merge; the strategy fails only if
    /// every slot failed.
    pub async fn parallel_execution(
        &self,
        dispatcher: &Dispatcher,
        task: &Task,
        min_parallel_tasks: usize,
    ) -> Result<Value> {
        let guard = self.scoped_team(team_id("par"), self.settings().max_team_agents);
        let team = guard.team_id().to_string();
        let team_entry = (context_keys::TEAM_ID.to_string(), json!(team));

        let subtasks: Vec<Task> = if task.subtasks.is_empty() {
            split_input(&task.input, min_parallel_tasks)
                .into_iter()
                .map(|slice| {
                    let mut sub = task.derive([team_entry.clone()]);
                    sub.input = slice;
                    sub
                })
                .collect()
        } else {
            task.subtasks
                .iter()
                .map(|sub| {
                    let mut sub = sub.clone();
                    sub.context.insert(team_entry.0.clone(), team_entry.1.clone());
                    sub
                })
                .collect()
        };

        let members = self.enroll_capable(dispatcher, &team, task, self.settings().max_team_agents);
        let assignments = match members {
            Ok(members) => self.round_robin(&team, members, subtasks)?,
            Err(CoordinationError::NoCapableAgent(_)) => self.per_subtask(dispatcher, &team, subtasks)?,
            Err(e) => return Err(e),
        };

        tracing::info!("Team {} executing {} subtask(s)", team, assignments.len());
        let options = ParallelOptions::new(self.settings().max_parallel_agents);
        let slots = run_assignments(dispatcher, assignments, options).await?;

        let total = slots.len();
        let mut results = Vec::with_capacity(total);
        let mut first_error = None;
        for slot in slots {
            match slot.result {
                Ok(value) => results.push(value),
                Err(e) => {
                    tracing::warn!("Team {} slot {} failed: {}", team, slot.index, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if results.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let strategy = task.merge_strategy.unwrap_or(MergeStrategy::Aggregate);
        self.merge_results(&team, results, strategy)
    }

    /// Run the top-scoring skills against the task and vote on the results
    pub async fn specialized_agents(&self, task: &Task, skills: &dyn SkillRegistry) -> Result<Value> {
        let mut found = skills.find_skills_for_task(task).await?;
        found.truncate(self.settings().max_specialized_skills);
        if found.is_empty() {
            return Err(CoordinationError::NoCapableAgent(task.task_type.clone()));
        }

        let guard = self.scoped_team(team_id("skills"), found.len());
        let team = guard.team_id().to_string();
        for scored in &found {
            let name = scored.skill.name();
            self.join_team(
                &team,
                name,
                json!({"score": scored.score, "capabilities": scored.skill.capabilities()}),
            )?;
            self.assign_task(&team, name, &task.id)?;
        }

        let count = found.len();
        let options = ParallelOptions::new(self.settings().max_parallel_agents);
        let slots = run_bounded(found, options, |scored| async move {
            let name = scored.skill.name().to_string();
            let started = Instant::now();
            let result = scored.skill.execute(task, &task.context).await;
            let elapsed = started.elapsed().as_millis();
            match &result {
                Ok(_) => tracing::info!("Skill {} finished in {}ms", name, elapsed),
                Err(e) => tracing::warn!("Skill {} failed after {}ms: {}", name, elapsed, e),
            }
            let result = result.map_err(|e| CoordinationError::execution_failed(&name, e));
            (Some(name), result)
        })
        .await?;

        let results: Vec<Value> = slots.into_iter().filter_map(|slot| slot.result.ok()).collect();
        if results.is_empty() {
            return Err(CoordinationError::AllSpecializedAgentsFailed(count));
        }
        self.merge_results(&team, results, MergeStrategy::Vote)
    }

    /// Enroll up to `limit` of the best capable agents
    fn enroll_capable(
        &self,
        dispatcher: &Dispatcher,
        team: &str,
        task: &Task,
        limit: usize,
    ) -> Result<Vec<String>> {
        let limit = limit.min(self.settings().max_team_agents).max(1);
        let capable = dispatcher.get_capable_agents(task);
        if capable.is_empty() {
            return Err(CoordinationError::NoCapableAgent(task.task_type.clone()));
        }

        let mut members = Vec::new();
        for candidate in capable.into_iter().take(limit) {
            self.join_team(team, &candidate.agent_id, json!({"score": candidate.score}))?;
            members.push(candidate.agent_id);
        }
        Ok(members)
    }

    fn round_robin(&self, team: &str, members: Vec<String>, subtasks: Vec<Task>) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::with_capacity(subtasks.len());
        for (index, task) in subtasks.into_iter().enumerate() {
            let agent_id = members[index % members.len()].clone();
            self.assign_task(team, &agent_id, &task.id)?;
            assignments.push(Assignment { agent_id, task });
        }
        Ok(assignments)
    }

    /// Fallback when no agent fits the parent task: pick one per subtask
    fn per_subtask(&self, dispatcher: &Dispatcher, team: &str, subtasks: Vec<Task>) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::with_capacity(subtasks.len());
        for task in subtasks {
            let agent_id = dispatcher
                .select_agent(&task)
                .ok_or_else(|| CoordinationError::NoCapableAgent(task.task_type.clone()))?;
            match self.join_team(team, &agent_id, json!({"fallback": true})) {
                Ok(()) => self.assign_task(team, &agent_id, &task.id)?,
                Err(CoordinationError::TeamFull { .. }) => {
                    tracing::warn!("Team {} is full; {} runs unrecorded", team, agent_id);
                }
                Err(e) => return Err(e),
            }
            assignments.push(Assignment { agent_id, task });
        }
        Ok(assignments)
    }
}

async fn run_assignments(
    dispatcher: &Dispatcher,
    assignments: Vec<Assignment>,
    options: ParallelOptions,
) -> Result<Vec<Slot>> {
    run_bounded(assignments, options, |assignment| async move {
        let result = dispatcher
            .dispatch_to(&assignment.agent_id, &assignment.task)
            .await;
        (Some(assignment.agent_id), result)
    })
    .await
}

/// Split a list input into `parts` contiguous, roughly equal slices
///
/// Non-list inputs (and lists too short to split) yield a single slice.
fn split_input(input: &Value, parts: usize) -> Vec<Value> {
    let items = match input.as_array() {
        Some(items) if items.len() > 1 && parts > 1 => items,
        _ => return vec![input.clone()],
    };

    let parts = parts.min(items.len());
    let base = items.len() / parts;
    let extra = items.len() % parts;

    let mut slices = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let len = base + usize::from(part < extra);
        slices.push(Value::Array(items[start..start + len].to_vec()));
        start += len;
    }
    slices
}
