use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Debug)]
struct QueueState<K> {
    queue: VecDeque<K>,
    /// Keys waiting to be processed, queued or not.
    dirty: FxHashSet<K>,
    /// Keys currently handed out to a worker.
    processing: FxHashSet<K>,
    shutting_down: bool,
}

struct QueueInner<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
}

/// Deduplicating work queue of object keys.
///
/// * A key added while already queued is coalesced into the queued entry.
/// * A key added while a worker processes it is marked dirty and queued again on
///   [`WorkQueue::done`], so one key is never processed by two workers at once.
/// * After [`WorkQueue::shutdown`], adds are ignored and [`WorkQueue::get`] returns `None`
///   once the queue is drained.
pub struct WorkQueue<K> {
    inner: Arc<QueueInner<K>>,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K: fmt::Debug> fmt::Debug for WorkQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WorkQueue")
            .field("queued", &state.queue.len())
            .field("processing", &state.processing.len())
            .field("shutting_down", &state.shutting_down)
            .finish()
    }
}

impl<K> Default for WorkQueue<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: FxHashSet::default(),
                    processing: FxHashSet::default(),
                    shutting_down: false,
                }),
                notify: Notify::new(),
            }),
        }
    }
}

impl<K> WorkQueue<K>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as needing processing.
    pub fn add(&self, key: K) {
        let mut state = self.inner.state.lock();
        if state.shutting_down || state.dirty.contains(&key) {
            return;
        }
        state.dirty.insert(key.clone());
        if state.processing.contains(&key) {
            trace!(?key, "Key is in flight; deferring until done");
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Adds `key` after `delay`. Requires a running tokio runtime.
    pub fn add_after(&self, key: K, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Waits for the next key. Returns `None` once the queue is shut down and drained.
    ///
    /// The caller owns the key until it calls [`WorkQueue::done`].
    pub async fn get(&self) -> Option<K> {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            notified.as_mut().enable();

            {
                let mut state = self.inner.state.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Releases `key` after processing. Re-queues it if it was added in the meantime.
    pub fn done(&self, key: &K) {
        let mut state = self.inner.state.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.clone());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Stops accepting keys and wakes every waiting worker.
    pub fn shutdown(&self) {
        self.inner.state.lock().shutting_down = true;
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.inner.state.lock().shutting_down
    }

    /// Number of keys waiting to be handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn coalesces_queued_duplicates() {
        let queue = WorkQueue::new();
        queue.add("a");
        queue.add("b");
        queue.add("a");
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, Some("b"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn key_added_during_processing_is_redelivered_after_done() {
        let queue = WorkQueue::new();
        queue.add("a");
        let key = queue.get().await;
        assert_eq!(key, Some("a"));

        queue.add("a");
        assert_eq!(queue.len(), 0, "in-flight key must not be queued twice");

        queue.done(&"a");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("a"));
        queue.done(&"a");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn shutdown_drains_then_stops() {
        let queue = WorkQueue::new();
        queue.add(1);
        queue.shutdown();
        queue.add(2);

        assert!(queue.is_shutting_down());
        assert_eq!(queue.get().await, Some(1));
        assert_eq!(queue.get().await, None);
    }
}
