//! # Events
//!
//! The delivery layer of the controller.
//!
//! * [`EventBus`]: type-safe broadcast channels keyed by the event's Rust type. The store
//!   publishes watch events on it; any number of controllers subscribe.
//! * [`WorkQueue`]: a deduplicating queue of object keys. A key is never handed to two
//!   workers at once, and keys added while in flight are re-delivered once processing ends.
//!
//! # Example
//!
//! ```rust
//! use hostbind_events::{EventBus, EventReceiverExt, EventBusError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct DomainChanged { name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<DomainChanged>()?;
//!
//!     bus.publish(DomainChanged { name: "acme.example".into() })?;
//!
//!     let event = rx.recv().await.unwrap();
//!     assert_eq!(event.name, "acme.example");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod queue;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use queue::WorkQueue;
pub use receiver::{EventReceiverExt, Received};
