//! End-to-End Messaging Tests
//!
//! Several agents registered together, talking through the bus.

use agent_comms::*;
use agent_runtime::{Agent, ManagedAgent, RetryPolicy, RuntimeError, Task};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Remembers every message it receives
struct Inbox {
    id: String,
    capabilities: Vec<String>,
    received: Mutex<Vec<(String, Value)>>,
}

impl Inbox {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            capabilities: vec!["chat".to_string()],
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Agent for Inbox {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    async fn execute(&self, task: &Task) -> agent_runtime::Result<Value> {
        Ok(task.input.clone())
    }

    async fn receive_message(&self, payload: &Value, from: &str) -> agent_runtime::Result<Value> {
        self.received.lock().push((from.to_string(), payload.clone()));
        Ok(json!({"seen": self.received.lock().len()}))
    }
}

/// Rejects every message
struct Grumpy;

#[async_trait]
impl Agent for Grumpy {
    fn id(&self) -> &str {
        "grumpy"
    }

    fn capabilities(&self) -> &[String] {
        &[]
    }

    async fn execute(&self, _task: &Task) -> agent_runtime::Result<Value> {
        Ok(Value::Null)
    }

    async fn receive_message(&self, _payload: &Value, _from: &str) -> agent_runtime::Result<Value> {
        Err(RuntimeError::execution("not listening"))
    }
}

fn register(registry: &AgentRegistry, agent: Arc<dyn Agent>) {
    registry.register(Arc::new(ManagedAgent::new(agent, RetryPolicy::no_retry())));
}

/// Test 1: Two agents can send messages to each other
#[tokio::test]
async fn test_two_agents_communicate() {
    let registry = AgentRegistry::new();
    let alice = Inbox::new("alice");
    let bob = Inbox::new("bob");
    register(&registry, alice.clone());
    register(&registry, bob.clone());

    let bus = MessageBus::new(100);
    let reply = bus
        .send(&registry, "alice", "bob", json!({"message": "Hello from Alice"}))
        .await
        .unwrap();
    assert_eq!(reply["seen"], 1);

    bus.send(&registry, "bob", "alice", json!({"message": "Hi Alice"}))
        .await
        .unwrap();

    let received = bob.received.lock();
    assert_eq!(received[0].0, "alice");
    assert_eq!(received[0].1["message"], "Hello from Alice");
    assert_eq!(alice.received.lock()[0].0, "bob");
    assert_eq!(bus.len(), 2);

    println!("✅ TEST 1 PASSED: Two agents communicated successfully!");
}

/// Test 2: A failing handler does not stop a broadcast
#[tokio::test]
async fn test_broadcast_survives_failing_agent() {
    let registry = AgentRegistry::new();
    let first = Inbox::new("first");
    let last = Inbox::new("last");
    register(&registry, Arc::new(Grumpy));
    register(&registry, first.clone());
    register(&registry, Inbox::new("coordinator"));
    register(&registry, last.clone());

    let bus = MessageBus::new(100);
    let deliveries = bus
        .broadcast(&registry, "coordinator", json!({"task_id": "task-123"}))
        .await;

    assert_eq!(deliveries.len(), 3);
    assert_eq!(deliveries[0].agent_id, "grumpy");
    assert!(!deliveries[0].success);
    assert!(deliveries[0].error.as_deref().unwrap().contains("not listening"));
    assert!(deliveries[1].success && deliveries[2].success);

    assert_eq!(first.received.lock()[0].1["task_id"], "task-123");
    assert_eq!(last.received.lock().len(), 1);

    let log = bus.history(None, 10);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].msg_type, MessageType::Broadcast);

    println!("✅ TEST 2 PASSED: Broadcast reached every agent but the sender!");
}

/// Test 3: Delivery errors surface with the target's id
#[tokio::test]
async fn test_delivery_failure_is_reported() {
    let registry = AgentRegistry::new();
    register(&registry, Arc::new(Grumpy));
    register(&registry, Inbox::new("caller"));

    let bus = MessageBus::new(100);
    let err = bus
        .send(&registry, "caller", "grumpy", json!("hello?"))
        .await
        .unwrap_err();

    match err {
        CommsError::DeliveryFailed { agent_id, message } => {
            assert_eq!(agent_id, "grumpy");
            assert!(message.contains("not listening"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Logged even though delivery failed
    assert_eq!(bus.history(Some("grumpy"), 10).len(), 1);

    println!("✅ TEST 3 PASSED: Delivery failure reported!");
}

/// Test 4: Unregistered agents stop receiving messages
#[tokio::test]
async fn test_removed_agent_is_unreachable() {
    let registry = AgentRegistry::new();
    register(&registry, Inbox::new("a"));
    register(&registry, Inbox::new("b"));
    registry.remove("b");

    let bus = MessageBus::new(100);
    let err = bus.send(&registry, "a", "b", json!(1)).await.unwrap_err();
    assert!(matches!(err, CommsError::TargetNotFound(_)));
    assert!(bus.broadcast(&registry, "a", json!(2)).await.is_empty());

    println!("✅ TEST 4 PASSED: Removed agent unreachable!");
}
