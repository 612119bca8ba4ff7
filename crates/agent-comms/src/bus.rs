//! Message bus
//!
//! Point-to-point and broadcast delivery through the agents'
//! `receive_message` handlers, with a bounded log of every message sent.

use agent_core::BoundedHistory;
use agent_telemetry::{OrchestrationEvent, TelemetryCollector};
use futures::future::join_all;
use serde_json::Value;

use crate::{AgentMessage, AgentRegistry, CommsError, Delivery, Result};

/// Delivers messages between registered agents and keeps a bounded log
#[derive(Debug)]
pub struct MessageBus {
    log: BoundedHistory<AgentMessage>,
    telemetry: Option<TelemetryCollector>,
}

impl MessageBus {
    pub fn new(max_messages: usize) -> Self {
        Self {
            log: BoundedHistory::new(max_messages),
            telemetry: None,
        }
    }

    /// Emit a `MessageSent` event for every logged message
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Send `payload` from `from` to `to` and return the target's response
    ///
    /// The message is logged before delivery, so a failing handler still
    /// leaves a record.
    pub async fn send(
        &self,
        registry: &AgentRegistry,
        from: &str,
        to: &str,
        payload: Value,
    ) -> Result<Value> {
        let target = registry
            .get(to)
            .ok_or_else(|| CommsError::TargetNotFound(to.to_string()))?;

        let message = AgentMessage::new(from, to, payload);
        self.record(message.clone());
        tracing::debug!("Message {} from {} to {}", message.id, from, to);

        target
            .receive_message(&message.content, from)
            .await
            .map_err(|e| CommsError::delivery_failed(to, e))
    }

    /// Deliver `payload` to every registered agent except `from`
    ///
    /// Deliveries run concurrently; one handler failing does not affect the
    /// others. Results are in registration order.
    pub async fn broadcast(
        &self,
        registry: &AgentRegistry,
        from: &str,
        payload: Value,
    ) -> Vec<Delivery> {
        let targets: Vec<_> = registry
            .list()
            .into_iter()
            .filter(|agent| agent.id() != from)
            .collect();

        let message = AgentMessage::broadcast(from, payload);
        self.record(message.clone());
        tracing::debug!("Broadcast {} from {} to {} agent(s)", message.id, from, targets.len());

        let content = &message.content;
        join_all(targets.iter().map(|agent| async move {
            match agent.receive_message(content, from).await {
                Ok(response) => Delivery::ok(agent.id(), response),
                Err(e) => {
                    tracing::warn!("Broadcast to {} failed: {}", agent.id(), e);
                    Delivery::failed(agent.id(), e)
                }
            }
        }))
        .await
    }

    /// Most recent `limit` messages, oldest first, optionally only those
    /// involving `agent_id`
    pub fn history(&self, agent_id: Option<&str>, limit: usize) -> Vec<AgentMessage> {
        match agent_id {
            Some(id) => self.log.recent_matching(limit, |m| m.involves(id)),
            None => self.log.recent(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    pub fn clear(&self) {
        self.log.clear();
    }

    fn record(&self, message: AgentMessage) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.emit(OrchestrationEvent::message_sent(
                message.id.clone(),
                message.from.clone(),
                message.to.clone(),
            ));
        }
        let evicted = self.log.push(message);
        if evicted > 0 {
            tracing::debug!("Message log full; evicted {} oldest message(s)", evicted);
        }
    }
}
