//! # Store
//!
//! In-memory implementation of the [`ResourceStore`](hostbind_kernel::ResourceStore) port
//! with API-server semantics:
//!
//! * objects are kept serialized, keyed by kind and [`ObjectKey`](hostbind_domain::ObjectKey);
//! * every write is conditional on the caller's `resource_version` and bumps it;
//! * deleting an object that holds finalizers only marks it, and the write that clears the
//!   last finalizer removes it;
//! * every change is published as a [`WatchEvent`](hostbind_kernel::WatchEvent) on the
//!   [`EventBus`](hostbind_events::EventBus).
//!
//! ## Example
//!
//! ```rust
//! use hostbind_domain::{Domain, ObjectKey};
//! use hostbind_events::EventBus;
//! use hostbind_kernel::{ResourceStore, StoreError};
//! use hostbind_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StoreError> {
//!     let store = MemoryStore::builder().bus(EventBus::new()).build();
//!
//!     let created = store.create(Domain::new("acme.example")).await?;
//!     assert_eq!(created.metadata.resource_version, 1);
//!
//!     let fetched: Domain = store.get(&ObjectKey::cluster("acme.example")).await?;
//!     assert_eq!(fetched.metadata.uid, created.metadata.uid);
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;

pub use builder::{NoBus, StoreBuilder, WithBus};
pub use engine::{MemoryStore, StoreInner};
