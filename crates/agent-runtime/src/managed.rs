//! Managed agents: run-state, statistics and retrying execution
//!
//! `ManagedAgent` is the only writer of an agent's run-state and
//! statistics. Callers (the dispatcher included) read snapshots.

use agent_core::RetrySettings;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{Agent, Result, RuntimeError, Task, TaskSummary};

/// Attempts and linear backoff applied around `Agent::execute`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call; 0 behaves like 1
    pub max_retries: u32,
    /// Attempt `n` waits `retry_delay * n` before attempt `n + 1`
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.max_retries, settings.retry_delay())
    }
}

/// What the agent is doing right now
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub is_active: bool,
    /// Most recently started task while active
    pub current_task: Option<TaskSummary>,
    pub last_execution_time: Option<DateTime<Utc>>,
}

/// Cumulative execution statistics, one entry per logical call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub total_time_ms: u64,
}

impl AgentStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_executions as f64
        }
    }

    pub fn average_time_ms(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.total_time_ms as f64 / self.total_executions as f64
        }
    }
}

/// Snapshot of a registered agent for introspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub priority: i32,
    pub state: AgentState,
    pub stats: AgentStats,
}

#[derive(Default)]
struct RunState {
    state: AgentState,
    in_flight: usize,
}

/// An agent together with its private run-state and statistics
pub struct ManagedAgent {
    agent: Arc<dyn Agent>,
    policy: RetryPolicy,
    run: Mutex<RunState>,
    stats: Mutex<AgentStats>,
}

impl ManagedAgent {
    pub fn new(agent: Arc<dyn Agent>, policy: RetryPolicy) -> Self {
        Self {
            agent,
            policy,
            run: Mutex::new(RunState::default()),
            stats: Mutex::new(AgentStats::default()),
        }
    }

    pub fn id(&self) -> &str {
        self.agent.id()
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn can_handle(&self, task: &Task) -> f64 {
        self.agent.can_handle(task)
    }

    pub fn state(&self) -> AgentState {
        self.run.lock().state.clone()
    }

    pub fn stats(&self) -> AgentStats {
        self.stats.lock().clone()
    }

    pub fn info(&self) -> AgentInfo {
        let mut capabilities = self.agent.capabilities().to_vec();
        capabilities.sort();
        AgentInfo {
            id: self.agent.id().to_string(),
            name: self.agent.name().to_string(),
            description: self.agent.description().to_string(),
            capabilities,
            priority: self.agent.priority(),
            state: self.state(),
            stats: self.stats(),
        }
    }

    /// Execute with retries and linear backoff
    ///
    /// Statistics and run-state are updated exactly once per call, whatever
    /// the number of attempts. If all attempts fail, the last error is
    /// returned. Dropping the returned future (e.g. on a dispatch timeout)
    /// counts as one failed execution.
    pub async fn execute_with_retry(&self, task: &Task) -> Result<Value> {
        let mut guard = ExecutionGuard::begin(self, task);
        let attempts = self.policy.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.agent.execute(task).await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(
                            "Agent {} succeeded on attempt {}/{}",
                            self.id(),
                            attempt,
                            attempts
                        );
                    }
                    guard.complete(true);
                    return Ok(result);
                }
                Err(e) => {
                    tracing::warn!(
                        "Agent {} attempt {}/{} failed: {}",
                        self.id(),
                        attempt,
                        attempts,
                        e
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        guard.complete(false);
        Err(last_error.unwrap_or_else(|| RuntimeError::execution("no attempt was made")))
    }

    /// Forward a peer message to the agent
    pub async fn receive_message(&self, payload: &Value, from: &str) -> Result<Value> {
        self.agent.receive_message(payload, from).await
    }

    fn mark_started(&self, task: &Task) {
        let mut run = self.run.lock();
        run.in_flight += 1;
        run.state.is_active = true;
        run.state.current_task = Some(task.summary());
    }

    fn mark_finished(&self, success: bool, elapsed: Duration) {
        {
            let mut stats = self.stats.lock();
            stats.total_executions += 1;
            if success {
                stats.successful_executions += 1;
            } else {
                stats.failed_executions += 1;
            }
            stats.total_time_ms += elapsed.as_millis() as u64;
        }

        let mut run = self.run.lock();
        run.in_flight = run.in_flight.saturating_sub(1);
        if run.in_flight == 0 {
            run.state.is_active = false;
            run.state.current_task = None;
        }
        run.state.last_execution_time = Some(Utc::now());
    }
}

impl std::fmt::Debug for ManagedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAgent")
            .field("id", &self.id())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Records exactly one outcome per call, even if the call is abandoned
struct ExecutionGuard<'a> {
    agent: &'a ManagedAgent,
    started: Instant,
    done: bool,
}

impl<'a> ExecutionGuard<'a> {
    fn begin(agent: &'a ManagedAgent, task: &Task) -> Self {
        agent.mark_started(task);
        Self {
            agent,
            started: Instant::now(),
            done: false,
        }
    }

    fn complete(&mut self, success: bool) {
        if !self.done {
            self.done = true;
            self.agent.mark_finished(success, self.started.elapsed());
        }
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!("Agent {} execution abandoned before completion", self.agent.id());
            self.complete(false);
        }
    }
}
