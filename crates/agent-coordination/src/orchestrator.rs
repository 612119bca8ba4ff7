//! Orchestrator facade
//!
//! Ties the decision engine, dispatcher and team coordinator together and
//! exposes the host control API. Construct one explicitly with
//! [`Orchestrator::builder`]; [`Orchestrator::shared`] is a lazily built
//! process-wide default for hosts that want one.

use agent_comms::{AgentMessage, Delivery};
use agent_core::OrchestratorConfig;
use agent_runtime::{Agent, AgentInfo, RetryPolicy, Task};
use agent_telemetry::{OrchestrationEvent, TelemetryCollector};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::dispatcher::{CapableAgent, DispatcherStats, ExecutionRecord};
use crate::executor::{ParallelOptions, TaskOutcome};
use crate::merge::Aggregator;
use crate::{
    CoordinationError, Decision, DecisionEngine, Dispatcher, Result, Scenario, SkillRegistry,
    TeamCoordinator,
};

static SHARED: Lazy<Orchestrator> = Lazy::new(|| Orchestrator::builder().build());

/// What [`Orchestrator::execute`] did and produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    /// None when a single agent handled the task
    pub scenario: Option<Scenario>,
    pub result: Value,
    pub decision: Decision,
}

/// Builder for constructing an [`Orchestrator`]
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    skills: Option<Arc<dyn SkillRegistry>>,
    aggregator: Option<Arc<dyn Aggregator>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn skill_registry(mut self, skills: Arc<dyn SkillRegistry>) -> Self {
        self.skills = Some(skills);
        self
    }

    /// Reducer for the `aggregate` merge strategy
    pub fn aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn build(self) -> Orchestrator {
        let config = self.config;
        let telemetry = TelemetryCollector::new(config.dispatcher.event_capacity);

        let dispatcher = Dispatcher::with_telemetry(
            config.dispatcher.clone(),
            config.agent.clone(),
            telemetry.clone(),
        );
        let decision = DecisionEngine::new(config.decision.clone(), self.skills.clone());
        let mut teams = TeamCoordinator::new(config.team.clone(), telemetry.clone());
        if let Some(aggregator) = self.aggregator {
            teams = teams.with_aggregator(aggregator);
        }

        tracing::debug!(
            "Orchestrator built (skill registry: {})",
            if self.skills.is_some() { "yes" } else { "no" }
        );

        Orchestrator {
            config,
            dispatcher,
            decision,
            teams,
            skills: self.skills,
            telemetry,
        }
    }
}

/// Entry point of the orchestration core
pub struct Orchestrator {
    config: OrchestratorConfig,
    dispatcher: Dispatcher,
    decision: DecisionEngine,
    teams: TeamCoordinator,
    skills: Option<Arc<dyn SkillRegistry>>,
    telemetry: TelemetryCollector,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn new(config: OrchestratorConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Process-wide default instance, built on first use
    pub fn shared() -> &'static Orchestrator {
        &SHARED
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn teams(&self) -> &TeamCoordinator {
        &self.teams
    }

    pub fn decision_engine(&self) -> &DecisionEngine {
        &self.decision
    }

    /// Receiver for orchestration events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.telemetry.subscribe()
    }

    /// Decide how the task should run without running it
    pub async fn plan(&self, task: &Task) -> Decision {
        self.decision.should_use_multi_agent(task).await
    }

    /// Classify the task and run it with the chosen strategy
    pub async fn execute(&self, task: &Task) -> Result<OrchestrationResult> {
        let decision = self.plan(task).await;
        tracing::info!("Task {} ({}): {}", task.id, task.task_type, decision.reason);
        self.telemetry.emit(OrchestrationEvent::strategy_selected(
            task.id.clone(),
            decision.scenario.map(|s| s.to_string()),
            decision.reason.clone(),
        ));

        let result = match decision.scenario {
            None => self.dispatcher.dispatch(task).await?,
            Some(Scenario::ContextPollution) => {
                self.teams.divide_context(&self.dispatcher, task).await?
            }
            Some(Scenario::Parallelization) => {
                self.teams
                    .parallel_execution(
                        &self.dispatcher,
                        task,
                        self.config.decision.min_parallel_tasks,
                    )
                    .await?
            }
            Some(Scenario::Specialization) => match &self.skills {
                Some(skills) => self.teams.specialized_agents(task, skills.as_ref()).await?,
                None => {
                    tracing::warn!(
                        "Task {} needs specialization but no skill registry is set; dispatching",
                        task.id
                    );
                    self.dispatcher.dispatch(task).await?
                }
            },
        };

        Ok(OrchestrationResult {
            scenario: decision.scenario,
            result,
            decision,
        })
    }

    /// Run the specialized-agents strategy regardless of the decision
    pub async fn execute_specialized(&self, task: &Task) -> Result<Value> {
        let skills = self
            .skills
            .as_ref()
            .ok_or(CoordinationError::SkillRegistryUnavailable)?;
        self.teams.specialized_agents(task, skills.as_ref()).await
    }

    // Host control API

    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> bool {
        self.dispatcher.register_agent(agent)
    }

    pub fn register_with_policy(&self, agent: Arc<dyn Agent>, policy: RetryPolicy) -> bool {
        self.dispatcher.register_with_policy(agent, policy)
    }

    pub fn unregister_agent(&self, agent_id: &str) -> bool {
        self.dispatcher.unregister_agent(agent_id)
    }

    pub fn list_agents(&self) -> Vec<AgentInfo> {
        self.dispatcher.list_agents()
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<AgentInfo> {
        self.dispatcher.get_agent(agent_id)
    }

    pub async fn dispatch(&self, task: &Task) -> Result<Value> {
        self.dispatcher.dispatch(task).await
    }

    pub async fn dispatch_to(&self, agent_id: &str, task: &Task) -> Result<Value> {
        self.dispatcher.dispatch_to(agent_id, task).await
    }

    /// `None` runs with the configured `dispatcher.max_concurrency`
    pub async fn execute_parallel(
        &self,
        tasks: Vec<Task>,
        options: impl Into<Option<ParallelOptions>>,
    ) -> Result<Vec<TaskOutcome>> {
        self.dispatcher.execute_parallel(tasks, options).await
    }

    pub async fn execute_chain(&self, tasks: Vec<Task>) -> Result<Value> {
        self.dispatcher.execute_chain(tasks).await
    }

    pub fn get_capable_agents(&self, task: &Task) -> Vec<CapableAgent> {
        self.dispatcher.get_capable_agents(task)
    }

    pub async fn send_message(&self, from: &str, to: &str, payload: Value) -> Result<Value> {
        self.dispatcher.send_message(from, to, payload).await
    }

    pub async fn broadcast(&self, from: &str, payload: Value) -> Vec<Delivery> {
        self.dispatcher.broadcast(from, payload).await
    }

    pub fn get_message_history(&self, agent_id: Option<&str>, limit: usize) -> Vec<AgentMessage> {
        self.dispatcher.get_message_history(agent_id, limit)
    }

    pub fn get_stats(&self) -> DispatcherStats {
        self.dispatcher.get_stats()
    }

    pub fn get_execution_history(&self, limit: usize) -> Vec<ExecutionRecord> {
        self.dispatcher.get_execution_history(limit)
    }

    pub fn reset_stats(&self) {
        self.dispatcher.reset_stats()
    }

    /// Dispatcher debug export with the full configuration and live teams
    pub fn export_debug_info(&self) -> Value {
        let mut info = self.dispatcher.export_debug_info();
        if let Value::Object(fields) = &mut info {
            fields.insert(
                "config".to_string(),
                serde_json::to_value(&self.config).unwrap_or(Value::Null),
            );
            fields.insert(
                "activeTeams".to_string(),
                serde_json::to_value(self.teams.active_teams()).unwrap_or(Value::Null),
            );
        }
        info
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("dispatcher", &self.dispatcher)
            .field("teams", &self.teams)
            .field("skills", &self.skills.is_some())
            .finish()
    }
}
