use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default buffer of a broadcast channel. Watchers that fall further behind are told they lagged.
const DEFAULT_CAPACITY: usize = 128;
const MIN_CAPACITY: usize = 1;

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct ChannelState {
    capacity: usize,
    sender: Box<dyn Any + Send + Sync>,
}

/// A thread-safe broadcast event bus.
///
/// Manages one channel per event type, indexed by its [`TypeId`]. Cloning the bus
/// shares the channels.
#[derive(Debug, Clone)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self { channels: Arc::default(), capacity: DEFAULT_CAPACITY }
    }
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus whose channels are created with the given buffer capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, EventBusError> {
        Ok(Self { channels: Arc::default(), capacity: validate_capacity(capacity)? })
    }

    /// Subscribes to events of type `T` with the bus capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry holds a foreign sender for `T`.
    ///
    /// # Examples
    /// ```rust
    /// use hostbind_events::{EventBus, EventReceiverExt};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct Applied(u64);
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), hostbind_events::EventBusError> {
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe::<Applied>()?;
    /// bus.publish(Applied(1))?;
    /// assert_eq!(rx.recv().await.unwrap().0, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(self.capacity)
    }

    /// Subscribes to events of type `T` with a specific broadcast buffer capacity.
    ///
    /// The capacity only applies when this call creates the channel.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if `capacity` is zero.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        let capacity = validate_capacity(capacity)?;
        Ok(self.ensure_channel::<T>(capacity)?.subscribe())
    }

    /// Publishes an event to every current subscriber of `T`.
    ///
    /// Returns the number of subscribers that received it; `0` is not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry holds a foreign sender for `T`.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes a shared event instance without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry holds a foreign sender for `T`.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let sender = self.ensure_channel::<T>(self.capacity)?;

        sender.send(event).map_or_else(
            |_| {
                trace!(event = std::any::type_name::<T>(), "Event dropped: no active subscribers");
                Ok(0)
            },
            |count| {
                trace!(event = std::any::type_name::<T>(), count, "Event dispatched");
                Ok(count)
            },
        )
    }

    /// Number of live subscribers for `T`.
    #[must_use]
    pub fn receiver_count<T: Event>(&self) -> usize {
        let channels = self.channels.read();
        channels
            .get(&TypeId::of::<T>())
            .and_then(|state| state.sender.downcast_ref::<broadcast::Sender<Arc<T>>>())
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Gracefully shuts down the bus by dropping all underlying channels.
    ///
    /// Subscribers observe a closed channel once buffered events are drained.
    /// Returns the number of event channels that were closed.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn ensure_channel<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        let id = TypeId::of::<T>();

        {
            let channels = self.channels.read();
            if let Some(existing) = channels.get(&id) {
                if existing.capacity != capacity {
                    warn!(
                        event = std::any::type_name::<T>(),
                        existing_capacity = existing.capacity,
                        requested_capacity = capacity,
                        "Broadcast channel already initialized with a different capacity"
                    );
                }
                return downcast_sender::<T>(existing);
            }
        }

        let mut channels = self.channels.write();
        let entry = channels.entry(id).or_insert_with(|| {
            trace!(event = std::any::type_name::<T>(), capacity, "Initializing new event channel");
            let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
            ChannelState { capacity, sender: Box::new(tx) }
        });
        downcast_sender::<T>(entry)
    }
}

fn downcast_sender<T: Event>(
    state: &ChannelState,
) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
    state.sender.downcast_ref::<broadcast::Sender<Arc<T>>>().cloned().ok_or_else(|| {
        EventBusError::TypeMismatch {
            message: std::any::type_name::<T>().into(),
            context: Some("Unexpected event type".into()),
        }
    })
}

fn validate_capacity(capacity: usize) -> Result<usize, EventBusError> {
    if capacity < MIN_CAPACITY {
        return Err(EventBusError::InvalidCapacity {
            message: format!("capacity must be >= {MIN_CAPACITY}").into(),
            context: None,
        });
    }
    Ok(capacity)
}
