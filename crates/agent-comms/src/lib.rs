//! Agent Communication Layer
//!
//! The ordered agent registry and the message bus agents talk through.
//!
//! # Example
//!
//! ```
//! use agent_comms::{AgentRegistry, MessageBus};
//! use agent_runtime::{builtin::FnAgent, ManagedAgent, RetryPolicy, Task};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AgentRegistry::new();
//!     for id in ["planner", "writer"] {
//!         let agent = FnAgent::new(id, ["chat"], |task: Task| async move { Ok(task.input) });
//!         registry.register(Arc::new(ManagedAgent::new(Arc::new(agent), RetryPolicy::default())));
//!     }
//!
//!     let bus = MessageBus::new(100);
//!     let ack = bus.send(&registry, "planner", "writer", json!({"text": "Hello!"})).await?;
//!     assert_eq!(ack["acknowledged"], true);
//!
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod error;
pub mod message;
pub mod registry;

// Re-exports
pub use bus::MessageBus;
pub use error::{CommsError, Result};
pub use message::{AgentMessage, Delivery, MessageType};
pub use registry::AgentRegistry;
