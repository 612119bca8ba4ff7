//! Event bus

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::OrchestrationEvent;

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 1000;

/// Broadcasts orchestration events to any number of subscribers
///
/// Subscribers that fall more than `capacity` events behind observe
/// `RecvError::Lagged` and skip ahead.
#[derive(Clone)]
pub struct TelemetryCollector {
    sender: Arc<broadcast::Sender<OrchestrationEvent>>,
}

impl TelemetryCollector {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit an event, returning how many subscribers it reached
    ///
    /// With no subscribers the event is dropped.
    pub fn emit(&self, event: OrchestrationEvent) -> usize {
        tracing::trace!(kind = event.kind(), "Orchestration event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Receiver for all events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for TelemetryCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryCollector")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
