//! Agent Telemetry
//!
//! Orchestration events and the channel they are published on.
//!
//! # Example
//!
//! ```
//! use agent_telemetry::{OrchestrationEvent, TelemetryCollector};
//!
//! let telemetry = TelemetryCollector::new(1000);
//! let mut subscriber = telemetry.subscribe();
//!
//! telemetry.emit(OrchestrationEvent::agent_unregistered("agent-1"));
//! assert_eq!(subscriber.try_recv().unwrap().kind(), "agent_unregistered");
//! ```

pub mod collector;
pub mod event;

// Re-exports
pub use collector::{TelemetryCollector, DEFAULT_CAPACITY};
pub use event::OrchestrationEvent;
