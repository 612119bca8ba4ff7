//! End-to-End Orchestration Tests
//!
//! Agents registered with a real orchestrator, tasks flowing through the
//! decision engine, dispatcher, executor and team strategies.

use agent_coordination::*;
use agent_core::{DecisionSettings, DispatcherSettings, OrchestratorConfig, RetrySettings, TeamSettings};
use agent_runtime::builtin::FnAgent;
use agent_runtime::{Agent, RetryPolicy, RuntimeError, Task};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        agent: RetrySettings {
            max_retries: 1,
            retry_delay_ms: 0,
        },
        dispatcher: DispatcherSettings {
            task_timeout_ms: 1_000,
            max_history: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn agent<F, Fut>(id: &str, caps: &[&str], handler: F) -> Arc<dyn Agent>
where
    F: Fn(Task) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = agent_runtime::Result<Value>> + Send + 'static,
{
    let caps: Vec<String> = caps.iter().map(|c| c.to_string()).collect();
    Arc::new(FnAgent::new(id, caps, handler))
}

fn tagged(id: &str, caps: &[&str]) -> Arc<dyn Agent> {
    let name = id.to_string();
    agent(id, caps, move |task: Task| {
        let name = name.clone();
        async move { Ok(json!({"by": name, "input": task.input})) }
    })
}

/// Test 1: Selection picks the strict best, ties go to the first registered
#[tokio::test]
async fn test_selection_and_tie_break() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(tagged("generalist", &["code_generation"]));
    orchestrator.register_agent(tagged("coder-a", &["code"]));
    orchestrator.register_agent(tagged("coder-b", &["code"]));

    let out = orchestrator.dispatch(&Task::new("code", json!(1))).await.unwrap();
    assert_eq!(out["by"], "coder-a");

    // Only partial matches: the first registered of them wins
    let out = orchestrator
        .dispatch(&Task::new("generation", json!(2)))
        .await
        .unwrap();
    assert_eq!(out["by"], "generalist");

    assert!(orchestrator.dispatcher().select_agent(&Task::new("cooking", Value::Null)).is_none());

    println!("✅ TEST 1 PASSED: Capability selection is deterministic!");
}

/// Test 2: Retries collapse into one logical execution
#[tokio::test(start_paused = true)]
async fn test_retry_through_dispatcher() {
    let orchestrator = Orchestrator::new(config());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    orchestrator.register_with_policy(
        agent("flaky", &["flaky"], move |_task: Task| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(RuntimeError::execution(format!("attempt {} failed", attempt)))
                } else {
                    Ok(json!("finally"))
                }
            }
        }),
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let calls_b = Arc::new(AtomicUsize::new(0));
    let counter_b = calls_b.clone();
    orchestrator.register_with_policy(
        agent("hopeless", &["hopeless"], move |_task: Task| {
            let attempt = counter_b.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err::<Value, _>(RuntimeError::execution(format!("attempt {} failed", attempt))) }
        }),
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let out = orchestrator.dispatch(&Task::new("flaky", Value::Null)).await.unwrap();
    assert_eq!(out, "finally");
    let stats = orchestrator.get_agent("flaky").unwrap().stats;
    assert_eq!((stats.successful_executions, stats.failed_executions), (1, 0));

    let err = orchestrator
        .dispatch(&Task::new("hopeless", Value::Null))
        .await
        .unwrap_err();
    assert_eq!(calls_b.load(Ordering::SeqCst), 3);
    assert!(err.to_string().contains("attempt 3 failed"));
    assert_eq!(orchestrator.get_agent("hopeless").unwrap().stats.failed_executions, 1);

    println!("✅ TEST 2 PASSED: Retries surface only the last error!");
}

/// Test 3: Parallel batch results stay in submission order
#[tokio::test(start_paused = true)]
async fn test_parallel_results_are_index_aligned() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(agent("sleeper", &["sleep"], |task: Task| async move {
        let ms = task.input.as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!(ms))
    }));

    let tasks: Vec<Task> = [50, 10, 30, 5, 20]
        .iter()
        .map(|ms| Task::new("sleep", json!(ms)))
        .collect();
    let outcomes = orchestrator
        .execute_parallel(tasks, ParallelOptions::new(2))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 5);
    let values: Vec<_> = outcomes.iter().map(|o| o.result.clone().unwrap()).collect();
    assert_eq!(values, vec![json!(50), json!(10), json!(30), json!(5), json!(20)]);
    assert!(outcomes.iter().all(|o| o.agent_id.as_deref() == Some("sleeper")));

    println!("✅ TEST 3 PASSED: Parallel results index-aligned!");
}

/// Test 4: Parallel failures are per slot unless stop_on_error
#[tokio::test]
async fn test_parallel_failure_modes() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(tagged("worker", &["work"]));

    let tasks = vec![
        Task::new("work", json!(1)),
        Task::new("unknown", json!(2)),
        Task::new("work", json!(3)),
    ];

    let outcomes = orchestrator
        .execute_parallel(tasks.clone(), ParallelOptions::new(3))
        .await
        .unwrap();
    assert!(outcomes[0].success && outcomes[2].success);
    assert!(!outcomes[1].success);
    assert!(outcomes[1].agent_id.is_none());

    let err = orchestrator
        .execute_parallel(tasks, ParallelOptions::new(1).stop_on_error(true))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinationError::NoCapableAgent(_)));

    println!("✅ TEST 4 PASSED: Parallel failure modes honoured!");
}

/// Test 5: Chains feed each result into the next step
#[tokio::test]
async fn test_chain_passes_previous_result() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(agent("step", &["step"], |task: Task| async move {
        Ok(json!({
            "previous": task.context.get("previousResult").cloned().unwrap_or(Value::Null),
            "index": task.context["chainIndex"],
            "input": task.input,
        }))
    }));

    let result = orchestrator
        .execute_chain(vec![Task::new("step", json!("first")), Task::new("step", json!("second"))])
        .await
        .unwrap();

    assert_eq!(result["input"], "second");
    assert_eq!(result["index"], 1);
    assert_eq!(result["previous"]["input"], "first");
    assert_eq!(result["previous"]["previous"], Value::Null);

    // A failing step aborts the chain
    let err = orchestrator
        .execute_chain(vec![
            Task::new("missing", Value::Null),
            Task::new("step", json!("never")),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinationError::NoCapableAgent(_)));
    assert_eq!(orchestrator.get_stats().completed_tasks, 2);

    assert_eq!(orchestrator.execute_chain(Vec::new()).await.unwrap(), Value::Null);

    println!("✅ TEST 5 PASSED: Chain execution works!");
}

/// Test 6: Decision order and thresholds
#[tokio::test]
async fn test_decision_engine_order() {
    let orchestrator = Orchestrator::builder()
        .config(OrchestratorConfig {
            decision: DecisionSettings {
                min_parallel_tasks: 2,
                ..Default::default()
            },
            ..config()
        })
        .build();

    let history: Vec<Value> = (0..60).map(|i| json!(format!("message {}", i))).collect();
    let subtasks: Vec<Task> = (0..5).map(|i| Task::new("part", json!(i))).collect();
    let polluted = Task::new("chat", Value::Null)
        .with_message_history(history)
        .with_subtasks(subtasks);
    assert_eq!(orchestrator.plan(&polluted).await.reason, "context_pollution");

    let parallel = Task::new("build", Value::Null)
        .with_subtasks((0..3).map(|i| Task::new("part", json!(i))).collect());
    assert_eq!(orchestrator.plan(&parallel).await.reason, "parallelization");

    let simple = Task::new("chat", json!("hello"));
    let decision = orchestrator.plan(&simple).await;
    assert!(!decision.use_multi_agent);

    println!("✅ TEST 6 PASSED: Decision engine order preserved!");
}

/// Test 7: Divide-context splits history into chunks and concatenates
#[tokio::test]
async fn test_divide_context_strategy() {
    let orchestrator = Orchestrator::new(config());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    orchestrator.register_agent(agent("reader", &["chat"], move |task: Task| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            let messages = task.context["messageHistory"].as_array().map_or(0, Vec::len);
            Ok(json!(format!(
                "chunk {}/{}: {} messages",
                task.context["chunkIndex"], task.context["totalChunks"], messages
            )))
        }
    }));

    let mut events = orchestrator.subscribe();
    let history: Vec<Value> = (0..55).map(|i| json!({"role": "user", "content": i.to_string()})).collect();
    let task = Task::new("chat", Value::Null).with_message_history(history);

    let outcome = orchestrator.execute(&task).await.unwrap();
    assert_eq!(outcome.scenario, Some(Scenario::ContextPollution));
    assert_eq!(seen.load(Ordering::SeqCst), 6);

    let text = outcome.result.as_str().unwrap();
    assert!(text.starts_with("chunk 0/6: 10 messages\n\n"));
    assert!(text.ends_with("chunk 5/6: 5 messages"));
    assert!(orchestrator.teams().active_teams().is_empty());

    let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.kind())
        .collect();
    assert_eq!(kinds.first(), Some(&"strategy_selected"));
    assert!(kinds.contains(&"team_created"));
    assert_eq!(kinds.last(), Some(&"team_destroyed"));

    println!("✅ TEST 7 PASSED: Context divided across the team!");
}

/// Test 8: Parallel-execution drops failed slots and aggregates the rest
#[tokio::test]
async fn test_parallel_execution_strategy() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(agent("summer", &["batch_processing"], |task: Task| async move {
        let items = task.input.as_array().cloned().unwrap_or_default();
        if items.iter().any(|v| v == "bad") {
            return Err(RuntimeError::invalid_input("bad item"));
        }
        Ok(json!(items.iter().filter_map(Value::as_i64).sum::<i64>()))
    }));

    let task = Task::new("batch_processing", json!([1, 2, 3, 4, 5, 6]));
    let outcome = orchestrator.execute(&task).await.unwrap();
    assert_eq!(outcome.scenario, Some(Scenario::Parallelization));
    assert_eq!(outcome.result, json!(21));

    let partial = Task::new("batch_processing", json!([1, 2, "bad", 4, 5, 6]));
    let outcome = orchestrator.execute(&partial).await.unwrap();
    assert_eq!(outcome.result, json!(14));

    let all_bad = Task::new("batch_processing", json!(["bad", "bad", "bad"]));
    let err = orchestrator.execute(&all_bad).await.unwrap_err();
    assert!(err.to_string().contains("bad item"));
    assert!(orchestrator.teams().active_teams().is_empty());

    println!("✅ TEST 8 PASSED: Parallel strategy tolerates partial failure!");
}

/// Test 9: Explicit subtasks with a vote merge
#[tokio::test]
async fn test_parallel_subtasks_vote() {
    let orchestrator = Orchestrator::new(config());
    orchestrator.register_agent(agent("answerer", &["answer"], |task: Task| async move {
        Ok(task.input)
    }));

    let task = Task::new("quiz", Value::Null)
        .with_subtasks(vec![
            Task::new("answer", json!("A")),
            Task::new("answer", json!("A")),
            Task::new("answer", json!("B")),
        ])
        .with_merge_strategy(agent_runtime::MergeStrategy::Vote);

    // "quiz" matches nobody, so each subtask picks its own agent
    let outcome = orchestrator.execute(&task).await.unwrap();
    assert_eq!(outcome.result, json!("A"));

    println!("✅ TEST 9 PASSED: Majority vote wins!");
}

struct FixedSkill {
    name: String,
    capabilities: Vec<String>,
    answer: Option<Value>,
}

#[async_trait]
impl Skill for FixedSkill {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    async fn execute(&self, _task: &Task, context: &Map<String, Value>) -> agent_runtime::Result<Value> {
        assert!(context.contains_key("origin"));
        self.answer
            .clone()
            .ok_or_else(|| RuntimeError::execution(format!("{} gave up", self.name)))
    }
}

fn skill(name: &str, answer: Option<Value>) -> Arc<dyn Skill> {
    Arc::new(FixedSkill {
        name: name.to_string(),
        capabilities: vec!["security_audit".to_string()],
        answer,
    })
}

/// Test 10: Specialized skills vote; all failing is an error
#[tokio::test]
async fn test_specialized_agents_strategy() {
    let registry = Arc::new(StaticSkillRegistry::new());
    registry.register(skill("static-analysis", Some(json!("vulnerable"))));
    registry.register(skill("fuzzer", None));
    registry.register(skill("reviewer", Some(json!("vulnerable"))));
    registry.register(skill("linter", Some(json!("clean"))));

    let orchestrator = Orchestrator::builder()
        .config(config())
        .skill_registry(registry.clone())
        .build();

    let task = Task::new("security_audit", Value::Null).with_context("origin", json!("test"));
    let outcome = orchestrator.execute(&task).await.unwrap();
    assert_eq!(outcome.scenario, Some(Scenario::Specialization));
    assert_eq!(outcome.decision.details["signal"], "skill_matches");
    assert_eq!(outcome.result, json!("vulnerable"));

    let failing = Arc::new(StaticSkillRegistry::new());
    failing.register(skill("a", None));
    failing.register(skill("b", None));
    let orchestrator = Orchestrator::builder()
        .config(config())
        .skill_registry(failing)
        .build();

    let err = orchestrator.execute(&task).await.unwrap_err();
    assert!(matches!(err, CoordinationError::AllSpecializedAgentsFailed(2)));
    assert!(orchestrator.teams().active_teams().is_empty());

    println!("✅ TEST 10 PASSED: Specialized agents voted!");
}

/// Test 11: Broadcast isolates failing receivers; histories stay bounded
#[tokio::test]
async fn test_broadcast_and_bounded_histories() {
    struct Deaf(Vec<String>);

    #[async_trait]
    impl Agent for Deaf {
        fn id(&self) -> &str {
            "deaf"
        }

        fn capabilities(&self) -> &[String] {
            &self.0
        }

        async fn execute(&self, _task: &Task) -> agent_runtime::Result<Value> {
            Ok(Value::Null)
        }

        async fn receive_message(&self, _payload: &Value, _from: &str) -> agent_runtime::Result<Value> {
            Err(RuntimeError::execution("cannot hear"))
        }
    }

    let orchestrator = Orchestrator::new(OrchestratorConfig {
        dispatcher: DispatcherSettings {
            max_messages: 3,
            max_history: 4,
            ..Default::default()
        },
        team: TeamSettings::default(),
        ..config()
    });
    orchestrator.register_agent(tagged("sender", &["echo"]));
    orchestrator.register_agent(Arc::new(Deaf(Vec::new())));
    orchestrator.register_agent(tagged("listener", &["listen"]));

    let deliveries = orchestrator.broadcast("sender", json!("news")).await;
    assert_eq!(deliveries.len(), 2);
    assert!(!deliveries[0].success);
    assert!(deliveries[1].success);

    for i in 0..5 {
        orchestrator
            .send_message("sender", "listener", json!(i))
            .await
            .unwrap();
        orchestrator.dispatch(&Task::new("echo", json!(i))).await.unwrap();
    }

    let messages = orchestrator.get_message_history(None, 100);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, json!(2));

    let executions = orchestrator.get_execution_history(100);
    assert_eq!(executions.len(), 4);
    assert_eq!(executions[0].result.as_ref().unwrap()["input"], 1);

    let debug = orchestrator.export_debug_info();
    assert_eq!(debug["recentMessages"].as_array().unwrap().len(), 3);
    assert_eq!(debug["stats"]["total_tasks"], 5);

    println!("✅ TEST 11 PASSED: Broadcast isolated failures; histories bounded!");
}

/// Test 12: A large context without history is processed as one chunk
#[tokio::test]
async fn test_divide_context_without_history() {
    let orchestrator = Orchestrator::new(OrchestratorConfig {
        decision: DecisionSettings {
            context_threshold_bytes: 100,
            ..Default::default()
        },
        ..config()
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    orchestrator.register_agent(agent("reader", &["chat"], move |task: Task| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            Ok(json!({
                "chunk": task.context["chunkIndex"],
                "total": task.context["totalChunks"],
                "hasHistory": task.context.contains_key("messageHistory"),
            }))
        }
    }));

    let task = Task::new("chat", Value::Null).with_description("x".repeat(500));
    let outcome = orchestrator.execute(&task).await.unwrap();

    assert_eq!(outcome.scenario, Some(Scenario::ContextPollution));
    assert_eq!(outcome.decision.details["signal"], "context_size");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.result, json!([{"chunk": 0, "total": 1, "hasHistory": false}]));
    assert!(orchestrator.teams().active_teams().is_empty());

    println!("✅ TEST 12 PASSED: History-less context ran as a single chunk!");
}

/// Test 13: One failing chunk fails divide-context and the team is still torn down
#[tokio::test]
async fn test_divide_context_chunk_failure() {
    let orchestrator = Orchestrator::new(OrchestratorConfig {
        decision: DecisionSettings {
            max_message_history: 20,
            ..Default::default()
        },
        ..config()
    });

    orchestrator.register_agent(agent("reader", &["chat"], |task: Task| async move {
        if task.context["chunkIndex"] == 1 {
            return Err(RuntimeError::execution("chunk unreadable"));
        }
        Ok(json!("ok"))
    }));

    let mut events = orchestrator.subscribe();
    let history: Vec<Value> = (0..25).map(|i| json!({"role": "user", "content": i.to_string()})).collect();
    let task = Task::new("chat", Value::Null).with_message_history(history);

    let err = orchestrator.execute(&task).await.unwrap_err();
    assert!(matches!(err, CoordinationError::AgentExecutionFailed { .. }));
    assert!(err.to_string().contains("chunk unreadable"));
    assert!(orchestrator.teams().active_teams().is_empty());

    let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.kind())
        .collect();
    assert!(kinds.contains(&"team_created"));
    assert_eq!(kinds.last(), Some(&"team_destroyed"));

    println!("✅ TEST 13 PASSED: Failed chunk fails the strategy and cleans up!");
}
