//! Capability-based dispatcher
//!
//! Scores every registered agent against a task, runs the best one under a
//! hard deadline and records the outcome in counters, per-agent usage and a
//! bounded execution history. Messaging goes through the same registry.

use agent_comms::{AgentMessage, AgentRegistry, Delivery, MessageBus};
use agent_core::{BoundedHistory, DispatcherSettings, RetrySettings};
use agent_runtime::{Agent, AgentInfo, ManagedAgent, RetryPolicy, Task, TaskSummary};
use agent_telemetry::{OrchestrationEvent, TelemetryCollector};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{CoordinationError, Result};

/// Records shown in the debug export
const DEBUG_EXPORT_LIMIT: usize = 20;

/// Outcome of one dispatched task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub task: TaskSummary,
    pub agent_id: String,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// An agent and how well it fits a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapableAgent {
    pub agent_id: String,
    pub score: f64,
}

/// Per-agent dispatch counters, kept across unregistration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUsage {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_time_ms: u64,
}

impl AgentUsage {
    pub fn average_time_ms(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.total_time_ms as f64 / self.invocations as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TaskCounters {
    total: u64,
    completed: u64,
    failed: u64,
}

/// Snapshot returned by [`Dispatcher::get_stats`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub success_rate: f64,
    pub registered_agents: usize,
    pub history_len: usize,
    pub message_count: usize,
    pub agent_usage: BTreeMap<String, AgentUsage>,
}

/// Routes tasks to agents and keeps the books
pub struct Dispatcher {
    settings: DispatcherSettings,
    retry: RetrySettings,
    registry: AgentRegistry,
    bus: MessageBus,
    history: BoundedHistory<ExecutionRecord>,
    usage: DashMap<String, AgentUsage>,
    counters: Mutex<TaskCounters>,
    telemetry: TelemetryCollector,
}

impl Dispatcher {
    pub fn new(settings: DispatcherSettings, retry: RetrySettings) -> Self {
        let telemetry = TelemetryCollector::new(settings.event_capacity);
        Self::with_telemetry(settings, retry, telemetry)
    }

    /// Build a dispatcher that publishes on an existing event channel
    pub fn with_telemetry(
        settings: DispatcherSettings,
        retry: RetrySettings,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            bus: MessageBus::new(settings.max_messages).with_telemetry(telemetry.clone()),
            history: BoundedHistory::new(settings.max_history),
            registry: AgentRegistry::new(),
            usage: DashMap::new(),
            counters: Mutex::new(TaskCounters::default()),
            settings,
            retry,
            telemetry,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Register an agent with the configured retry policy
    ///
    /// Returns true when an agent with the same id was replaced; the replaced
    /// agent is shut down.
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> bool {
        let policy = RetryPolicy::from(&self.retry);
        self.register_with_policy(agent, policy)
    }

    pub fn register_with_policy(&self, agent: Arc<dyn Agent>, policy: RetryPolicy) -> bool {
        let id = agent.id().to_string();
        let capabilities = agent.capabilities().to_vec();

        let previous = self
            .registry
            .register(Arc::new(ManagedAgent::new(agent, policy)));
        let replaced = match previous {
            Some(previous) => {
                previous.agent().shutdown();
                true
            }
            None => false,
        };
        self.usage.entry(id.clone()).or_default();

        tracing::info!("Agent {} registered with capabilities {:?}", id, capabilities);
        self.telemetry
            .emit(OrchestrationEvent::agent_registered(id, capabilities, replaced));
        replaced
    }

    /// Remove an agent and release its handles; usage counters are kept
    pub fn unregister_agent(&self, agent_id: &str) -> bool {
        match self.registry.remove(agent_id) {
            Some(managed) => {
                managed.agent().shutdown();
                tracing::info!("Agent {} unregistered", agent_id);
                self.telemetry
                    .emit(OrchestrationEvent::agent_unregistered(agent_id));
                true
            }
            None => false,
        }
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<AgentInfo> {
        self.registry.get(agent_id).map(|managed| managed.info())
    }

    /// Agent snapshots in registration order
    pub fn list_agents(&self) -> Vec<AgentInfo> {
        self.registry.list().iter().map(|managed| managed.info()).collect()
    }

    /// Best-scoring agent for the task, if any scores above zero
    ///
    /// Only a strictly higher score displaces the current best, so ties go
    /// to the earliest-registered agent.
    pub fn select_agent(&self, task: &Task) -> Option<String> {
        let mut best: Option<(String, f64)> = None;
        for managed in self.registry.list() {
            let score = managed.can_handle(task);
            if score <= 0.0 {
                continue;
            }
            match &best {
                Some((_, best_score)) if score <= *best_score => {}
                _ => best = Some((managed.id().to_string(), score)),
            }
        }

        if let Some((id, score)) = &best {
            tracing::debug!("Selected agent {} for '{}' (score {})", id, task.task_type, score);
        }
        best.map(|(id, _)| id)
    }

    /// Every agent scoring above zero, best first (ties in registration order)
    pub fn get_capable_agents(&self, task: &Task) -> Vec<CapableAgent> {
        let mut capable: Vec<CapableAgent> = self
            .registry
            .list()
            .iter()
            .map(|managed| CapableAgent {
                agent_id: managed.id().to_string(),
                score: managed.can_handle(task),
            })
            .filter(|candidate| candidate.score > 0.0)
            .collect();

        capable.sort_by(|a, b| b.score.total_cmp(&a.score));
        capable
    }

    /// Run the task on the best-matching agent
    pub async fn dispatch(&self, task: &Task) -> Result<Value> {
        self.dispatch_traced(task).await.1
    }

    /// Run the task on a specific agent, bypassing selection
    pub async fn dispatch_to(&self, agent_id: &str, task: &Task) -> Result<Value> {
        let managed = self
            .registry
            .get(agent_id)
            .ok_or_else(|| CoordinationError::AgentNotFound(agent_id.to_string()))?;
        self.run_on(managed, task).await
    }

    /// Like [`dispatch`](Self::dispatch), also reporting which agent ran
    pub(crate) async fn dispatch_traced(&self, task: &Task) -> (Option<String>, Result<Value>) {
        let selected = self
            .select_agent(task)
            .and_then(|agent_id| self.registry.get(&agent_id));

        match selected {
            Some(managed) => {
                let agent_id = managed.id().to_string();
                (Some(agent_id), self.run_on(managed, task).await)
            }
            None => {
                let err = CoordinationError::NoCapableAgent(task.task_type.clone());
                tracing::error!("Dispatch of task {} failed: {}", task.id, err);
                self.telemetry.emit(OrchestrationEvent::task_failed(
                    uuid::Uuid::new_v4().to_string(),
                    task.id.clone(),
                    task.task_type.clone(),
                    None,
                    err.to_string(),
                    0,
                ));
                (None, Err(err))
            }
        }
    }

    async fn run_on(&self, managed: Arc<ManagedAgent>, task: &Task) -> Result<Value> {
        let agent_id = managed.id().to_string();
        let timeout = self.settings.task_timeout();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, managed.execute_with_retry(task)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CoordinationError::execution_failed(&agent_id, e)),
            Err(_) => Err(CoordinationError::AgentTimeout {
                agent_id: agent_id.clone(),
                timeout,
            }),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        self.record_outcome(&agent_id, task, &outcome, duration_ms);
        outcome
    }

    fn record_outcome(&self, agent_id: &str, task: &Task, outcome: &Result<Value>, duration_ms: u64) {
        let success = outcome.is_ok();
        {
            let mut counters = self.counters.lock();
            counters.total += 1;
            if success {
                counters.completed += 1;
            } else {
                counters.failed += 1;
            }
        }
        {
            let mut usage = self.usage.entry(agent_id.to_string()).or_default();
            usage.invocations += 1;
            usage.total_time_ms += duration_ms;
            if success {
                usage.successes += 1;
            } else {
                usage.failures += 1;
            }
        }

        let record = ExecutionRecord {
            execution_id: uuid::Uuid::new_v4().to_string(),
            task: task.summary(),
            agent_id: agent_id.to_string(),
            result: outcome.as_ref().ok().cloned(),
            error: outcome.as_ref().err().map(ToString::to_string),
            duration_ms,
            timestamp: Utc::now(),
        };

        let event = match &record.error {
            None => {
                tracing::info!(
                    "Task {} ({}) completed by {} in {}ms",
                    task.id,
                    task.task_type,
                    agent_id,
                    duration_ms
                );
                OrchestrationEvent::task_completed(
                    record.execution_id.clone(),
                    task.id.clone(),
                    task.task_type.clone(),
                    agent_id,
                    duration_ms,
                )
            }
            Some(error) => {
                tracing::error!("Task {} ({}) failed on {}: {}", task.id, task.task_type, agent_id, error);
                OrchestrationEvent::task_failed(
                    record.execution_id.clone(),
                    task.id.clone(),
                    task.task_type.clone(),
                    Some(agent_id.to_string()),
                    error.clone(),
                    duration_ms,
                )
            }
        };

        self.history.push(record);
        self.telemetry.emit(event);
    }

    /// Send a message to one agent and return its response
    pub async fn send_message(&self, from: &str, to: &str, payload: Value) -> Result<Value> {
        Ok(self.bus.send(&self.registry, from, to, payload).await?)
    }

    /// Deliver a message to every agent except the sender
    pub async fn broadcast(&self, from: &str, payload: Value) -> Vec<Delivery> {
        self.bus.broadcast(&self.registry, from, payload).await
    }

    pub fn get_message_history(&self, agent_id: Option<&str>, limit: usize) -> Vec<AgentMessage> {
        self.bus.history(agent_id, limit)
    }

    pub fn get_stats(&self) -> DispatcherStats {
        let counters = *self.counters.lock();
        let success_rate = if counters.total == 0 {
            0.0
        } else {
            counters.completed as f64 / counters.total as f64
        };

        DispatcherStats {
            total_tasks: counters.total,
            completed_tasks: counters.completed,
            failed_tasks: counters.failed,
            success_rate,
            registered_agents: self.registry.len(),
            history_len: self.history.len(),
            message_count: self.bus.len(),
            agent_usage: self
                .usage
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        }
    }

    /// Most recent `limit` execution records, oldest first
    pub fn get_execution_history(&self, limit: usize) -> Vec<ExecutionRecord> {
        self.history.recent(limit)
    }

    /// Zero the counters and clear both histories
    ///
    /// Agent-owned statistics are untouched.
    pub fn reset_stats(&self) {
        *self.counters.lock() = TaskCounters::default();
        for mut usage in self.usage.iter_mut() {
            *usage = AgentUsage::default();
        }
        self.history.clear();
        self.bus.clear();
        tracing::info!("Dispatcher statistics reset");
    }

    pub fn export_debug_info(&self) -> Value {
        json!({
            "timestamp": Utc::now(),
            "config": {
                "dispatcher": self.settings,
                "agent": self.retry,
            },
            "agents": self.list_agents(),
            "stats": self.get_stats(),
            "recentExecutions": self.get_execution_history(DEBUG_EXPORT_LIMIT),
            "recentMessages": self.get_message_history(None, DEBUG_EXPORT_LIMIT),
        })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherSettings::default(), RetrySettings::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish()
    }
}
