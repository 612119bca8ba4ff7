//! Parallel and chained execution
//!
//! [`run_bounded`] is the shared fan-out loop: at most `max_concurrency`
//! jobs in flight, the next queued job launched whenever one finishes, and
//! every outcome stored at its submission index.

use agent_runtime::task::context_keys;
use agent_runtime::Task;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Instant;

use crate::{Dispatcher, Result};

/// Concurrency and failure policy for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelOptions {
    /// Jobs in flight at once; 0 behaves like 1
    pub max_concurrency: usize,
    /// Fail the batch on the first failure once in-flight jobs settle
    pub stop_on_error: bool,
}

impl ParallelOptions {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            stop_on_error: false,
        }
    }

    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}

/// Outcome of one job, still carrying the typed error
#[derive(Debug)]
pub struct Slot {
    pub index: usize,
    pub agent_id: Option<String>,
    pub result: Result<Value>,
    pub duration_ms: u64,
}

/// Serializable per-slot outcome of a parallel batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub index: usize,
    pub agent_id: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl From<Slot> for TaskOutcome {
    fn from(slot: Slot) -> Self {
        let (result, error) = match slot.result {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            index: slot.index,
            agent_id: slot.agent_id,
            success: error.is_none(),
            result,
            error,
            duration_ms: slot.duration_ms,
        }
    }
}

/// Run `jobs` through `run` with bounded concurrency
///
/// Returns slots in submission order. With `stop_on_error`, no new job is
/// launched after the first failure; in-flight jobs are awaited and then
/// the first failure is returned.
pub async fn run_bounded<J, F, Fut>(jobs: Vec<J>, options: ParallelOptions, mut run: F) -> Result<Vec<Slot>>
where
    F: FnMut(J) -> Fut,
    Fut: Future<Output = (Option<String>, Result<Value>)>,
{
    let limit = options.max_concurrency.max(1);
    let total = jobs.len();
    let mut queue = jobs.into_iter().enumerate();
    let mut running = FuturesUnordered::new();
    let mut slots: Vec<Option<Slot>> = (0..total).map(|_| None).collect();
    let mut first_error = None;

    loop {
        while first_error.is_none() && running.len() < limit {
            let Some((index, job)) = queue.next() else {
                break;
            };
            let fut = run(job);
            running.push(async move {
                let started = Instant::now();
                let (agent_id, result) = fut.await;
                Slot {
                    index,
                    agent_id,
                    result,
                    duration_ms: started.elapsed().as_millis() as u64,
                }
            });
        }

        let Some(slot) = running.next().await else {
            break;
        };

        if options.stop_on_error && first_error.is_none() {
            if let Err(e) = slot.result {
                tracing::warn!("Job {} failed; not launching further jobs", slot.index);
                first_error = Some(e);
                continue;
            }
        }
        let index = slot.index;
        slots[index] = Some(slot);
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(slots.into_iter().flatten().collect())
}

impl Dispatcher {
    /// Batch options from the configured `max_concurrency`
    pub fn parallel_options(&self) -> ParallelOptions {
        ParallelOptions::new(self.settings().max_concurrency)
    }

    /// Dispatch every task with bounded concurrency
    ///
    /// Results are index-aligned with `tasks`. Failures are captured per slot
    /// unless `stop_on_error` is set. `None` uses [`parallel_options`](Self::parallel_options).
    pub async fn execute_parallel(
        &self,
        tasks: Vec<Task>,
        options: impl Into<Option<ParallelOptions>>,
    ) -> Result<Vec<TaskOutcome>> {
        let options = options
            .into()
            .unwrap_or_else(|| self.parallel_options());
        tracing::info!(
            "Executing {} task(s) in parallel (max concurrency {})",
            tasks.len(),
            options.max_concurrency.max(1)
        );
        let slots = run_bounded(tasks, options, |task| async move {
            self.dispatch_traced(&task).await
        })
        .await?;
        Ok(slots.into_iter().map(TaskOutcome::from).collect())
    }

    /// Dispatch tasks one after another, feeding each result forward
    ///
    /// Every task after the first sees the preceding result under
    /// `previousResult`; each task carries its own position as `chainIndex`.
    /// The first failure aborts the rest of the chain.
    pub async fn execute_chain(&self, tasks: Vec<Task>) -> Result<Value> {
        let mut previous: Option<Value> = None;

        for (index, mut task) in tasks.into_iter().enumerate() {
            if let Some(result) = previous.take() {
                task.context
                    .insert(context_keys::PREVIOUS_RESULT.to_string(), result);
            }
            task.context
                .insert(context_keys::CHAIN_INDEX.to_string(), json!(index));

            tracing::debug!("Chain step {} ({})", index, task.task_type);
            previous = Some(self.dispatch(&task).await?);
        }

        Ok(previous.unwrap_or(Value::Null))
    }
}
