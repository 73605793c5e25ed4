//! Watch-driven runtime around the [`Reconciler`].
//!
//! Watch events from the store are mapped to registration identities and fed into a
//! deduplicating [`WorkQueue`]; a fixed pool of workers drains it. A `Domain` change
//! re-delivers every registration listed on it. Lagging watch receivers trigger a resync of
//! all registrations, so a dropped event costs a few redundant passes but never a missed one.

use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::naming::DnsNaming;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::references::registration_identities_of;
use crate::tokens::TokenGenerator;
use hostbind_domain::config::RuntimeConfig;
use hostbind_domain::{Domain, DomainRegistration, ObjectKey, Resource};
use hostbind_events::{EventBus, EventReceiverExt, Received, WorkQueue};
use hostbind_kernel::{ResourceStore, WatchEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Queue = WorkQueue<ObjectKey>;

/// Configured, not yet running controller.
#[derive(Debug)]
pub struct Controller<S, T, N> {
    reconciler: Arc<Reconciler<S, T, N>>,
    bus: EventBus,
    workers: usize,
    requeue_delay: Duration,
}

impl<S, T, N> Controller<S, T, N>
where
    S: ResourceStore,
    T: TokenGenerator,
    N: DnsNaming,
{
    /// `bus` must be the bus the store publishes its watch events on.
    pub fn new(reconciler: Arc<Reconciler<S, T, N>>, bus: EventBus, runtime: &RuntimeConfig) -> Self {
        Self { reconciler, bus, workers: runtime.workers, requeue_delay: runtime.requeue_delay() }
    }

    /// Subscribes to the watches, enqueues every existing registration and spawns the tasks.
    ///
    /// Requires a running tokio runtime.
    ///
    /// # Errors
    /// Fails when no worker is configured, a watch cannot be subscribed or the initial listing
    /// of registrations fails.
    pub async fn start(self) -> Result<ControllerHandle, RegistrationError> {
        if self.workers == 0 {
            return Err(RegistrationError::from("at least one worker is required"));
        }

        let registrations = self
            .bus
            .subscribe::<WatchEvent<DomainRegistration>>()
            .context("Subscribing to registration events")?;
        let domains = self
            .bus
            .subscribe::<WatchEvent<Domain>>()
            .context("Subscribing to domain events")?;

        let queue = Queue::new();
        let synced = resync(self.reconciler.store().as_ref(), &queue)
            .await
            .context("Initial registration sync")?;

        let (shutdown, signal) = watch::channel(false);
        let store = Arc::clone(self.reconciler.store());
        let mut tasks = vec![
            tokio::spawn(watch_registrations(Arc::clone(&store), registrations, queue.clone(), signal.clone())),
            tokio::spawn(watch_domains(store, domains, queue.clone(), signal)),
        ];
        for worker in 0..self.workers {
            tasks.push(tokio::spawn(run_worker(
                worker,
                Arc::clone(&self.reconciler),
                queue.clone(),
                self.requeue_delay,
            )));
        }

        info!(workers = self.workers, registrations = synced, "Controller started");
        Ok(ControllerHandle { shutdown, queue, tasks })
    }
}

/// Handle to a running controller.
#[derive(Debug)]
pub struct ControllerHandle {
    shutdown: watch::Sender<bool>,
    queue: Queue,
    tasks: Vec<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Number of identities waiting for a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stops the watches, lets workers finish the queued identities and waits for every task.
    pub async fn shutdown(self) {
        info!("Stopping controller");
        self.shutdown.send_replace(true);
        self.queue.shutdown();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Controller task ended abnormally");
            }
        }
        info!("Controller stopped");
    }
}

/// Enqueues every stored registration. Returns how many were enqueued.
async fn resync<S: ResourceStore>(store: &S, queue: &Queue) -> Result<usize, hostbind_kernel::StoreError> {
    let registrations = store.list::<DomainRegistration>().await?;
    let count = registrations.len();
    for registration in registrations {
        queue.add(registration.key());
    }
    Ok(count)
}

async fn resync_after_lag<S: ResourceStore>(store: &S, queue: &Queue, skipped: u64) {
    match resync(store, queue).await {
        Ok(count) => info!(skipped, registrations = count, "Resynced after missed watch events"),
        Err(err) => warn!(skipped, error = %err, "Resync after missed watch events failed"),
    }
}

async fn watch_registrations<S: ResourceStore>(
    store: Arc<S>,
    mut events: broadcast::Receiver<Arc<WatchEvent<DomainRegistration>>>,
    queue: Queue,
    mut signal: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = signal.changed() => break,
            received = events.recv_or_lag() => match received {
                Some(Received::Event(event)) => queue.add(event.object().key()),
                Some(Received::Lagged(skipped)) => resync_after_lag(store.as_ref(), &queue, skipped).await,
                None => break,
            },
        }
    }
    debug!("Registration watch stopped");
}

async fn watch_domains<S: ResourceStore>(
    store: Arc<S>,
    mut events: broadcast::Receiver<Arc<WatchEvent<Domain>>>,
    queue: Queue,
    mut signal: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = signal.changed() => break,
            received = events.recv_or_lag() => match received {
                Some(Received::Event(event)) => {
                    let domain = event.object();
                    let keys = registration_identities_of(domain);
                    debug!(domain = domain.hostname(), registrations = keys.len(), "Domain changed");
                    for key in keys {
                        queue.add(key);
                    }
                },
                Some(Received::Lagged(skipped)) => resync_after_lag(store.as_ref(), &queue, skipped).await,
                None => break,
            },
        }
    }
    debug!("Domain watch stopped");
}

async fn run_worker<S, T, N>(id: usize, reconciler: Arc<Reconciler<S, T, N>>, queue: Queue, requeue_delay: Duration)
where
    S: ResourceStore,
    T: TokenGenerator,
    N: DnsNaming,
{
    debug!(worker = id, "Worker started");
    while let Some(key) = queue.get().await {
        match reconciler.reconcile(&key).await {
            Ok(ReconcileOutcome::Done) => {},
            Ok(ReconcileOutcome::Requeue) => queue.add(key.clone()),
            Err(err) => {
                warn!(
                    worker = id,
                    registration = %key,
                    error = %err,
                    kind = err.kind(),
                    retry_in_ms = requeue_delay.as_millis(),
                    "Reconcile failed"
                );
                queue.add_after(key.clone(), requeue_delay);
            },
        }
        queue.done(&key);
    }
    debug!(worker = id, "Worker stopped");
}
