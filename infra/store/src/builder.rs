use crate::engine::{MemoryStore, StoreInner};
use chrono::{DateTime, Utc};
use hostbind_events::EventBus;
use parking_lot::RwLock;
use private::Sealed;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoBus;
#[derive(Debug)]
pub struct WithBus(EventBus);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoBus {}
impl Sealed for WithBus {}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct StoreBuilder<S: Sealed = NoBus> {
    state: S,
    clock: fn() -> DateTime<Utc>,
}

impl Default for StoreBuilder<NoBus> {
    fn default() -> Self {
        Self { state: NoBus, clock: Utc::now }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> StoreBuilder<S> {
    /// Overrides the source of creation and deletion timestamps.
    #[must_use = "Sets the clock used for server-managed timestamps"]
    pub const fn clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

impl StoreBuilder<NoBus> {
    #[must_use = "Creates a new store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the bus the store publishes watch events on"]
    pub fn bus(self, bus: EventBus) -> StoreBuilder<WithBus> {
        StoreBuilder { state: WithBus(bus), clock: self.clock }
    }
}

impl StoreBuilder<WithBus> {
    /// Consumes the configuration and returns an empty store.
    #[must_use]
    pub fn build(self) -> MemoryStore {
        info!("Initialized in-memory resource store");
        MemoryStore {
            inner: Arc::new(StoreInner {
                objects: RwLock::default(),
                bus: self.state.0,
                clock: self.clock,
            }),
        }
    }
}
