use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Result of [`EventReceiverExt::recv_or_lag`].
#[derive(Debug)]
pub enum Received<T> {
    Event(Arc<T>),
    /// The receiver fell behind and this many events were dropped.
    Lagged(u64),
}

/// An extension trait for event receivers to provide a more ergonomic API.
pub trait EventReceiverExt<T> {
    /// Receive the next event, skipping over lag. Returns `None` when the channel is closed.
    fn recv(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;

    /// Receive the next event, surfacing lag to the caller instead of skipping it.
    ///
    /// Watchers that derive state from events use this to trigger a full resync.
    fn recv_or_lag(&mut self) -> impl Future<Output = Option<Received<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for broadcast::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        let mut skipped = 0u64;

        loop {
            match self.recv().await {
                Ok(event) => {
                    if skipped > 0 {
                        warn!(
                            event = std::any::type_name::<T>(),
                            skipped = skipped,
                            "EventBus receiver lagged; continuing from latest message"
                        );
                    }
                    return Some(event);
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    skipped = skipped.saturating_add(n);
                    debug!(
                        event = std::any::type_name::<T>(),
                        skipped = n,
                        total_skipped = skipped,
                        "EventBus receiver lagged; accumulating skipped events"
                    );
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn recv_or_lag(&mut self) -> Option<Received<T>> {
        match self.recv().await {
            Ok(event) => Some(Received::Event(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(event = std::any::type_name::<T>(), skipped = n, "EventBus receiver lagged");
                Some(Received::Lagged(n))
            },
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
