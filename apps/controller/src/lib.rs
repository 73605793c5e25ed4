//! # Hostbind Controller
//!
//! Runs the domain registration controller against the in-memory resource store.
//!
//! ## Example
//! ```no_run
//! use hostbind_controller::App;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     App::builder().workers(4).build().await?.run().await
//! }
//! ```

mod seed;

pub use seed::SeedManifest;

use anyhow::{Context, Result};
use hostbind_domain::config::ControllerConfig;
use hostbind_events::EventBus;
use hostbind_registration::{Controller, ControllerHandle, Reconciler};
use hostbind_store::MemoryStore;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for configuring and initializing the [`App`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct AppBuilder {
    cfg: ControllerConfig,
}

impl AppBuilder {
    /// Set up the controller's configuration.
    pub fn config(mut self, cfg: ControllerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.cfg.controller.workers = workers;
        self
    }

    /// Consumes the builder and prepares the store.
    ///
    /// # Process
    /// 1. Creates the event bus the store publishes watch events on
    /// 2. Creates the in-memory store
    /// 3. Applies the seed manifest, if configured
    ///
    /// # Errors
    /// Returns an error if the queue capacity is zero or the seed manifest cannot be applied.
    pub async fn build(self) -> Result<App> {
        let bus = EventBus::with_capacity(self.cfg.controller.queue_capacity)
            .context("Invalid controller.queue_capacity")?;
        let store = Arc::new(MemoryStore::builder().bus(bus.clone()).build());

        if let Some(path) = &self.cfg.seed {
            SeedManifest::from_file(path)?.apply(store.as_ref()).await?;
        }

        Ok(App { cfg: self.cfg, bus, store })
    }
}

/// A configured controller that has not started yet.
#[derive(Debug)]
pub struct App {
    cfg: ControllerConfig,
    bus: EventBus,
    store: Arc<MemoryStore>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Starts the watches and the workers.
    ///
    /// # Errors
    /// Returns an error if the controller cannot subscribe to the store or list registrations.
    pub async fn start(self) -> Result<RunningApp> {
        let reconciler = Reconciler::builder()
            .from_config(&self.cfg)
            .store(Arc::clone(&self.store))
            .build();

        let handle = Controller::new(Arc::new(reconciler), self.bus.clone(), &self.cfg.controller)
            .start()
            .await
            .context("Failed to start controller")?;

        Ok(RunningApp { bus: self.bus, store: self.store, handle })
    }

    /// Starts the controller and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the controller fails to start.
    pub async fn run(self) -> Result<()> {
        let running = self.start().await?;

        if let Err(e) = shutdown_signal().await {
            error!("Error while waiting for shutdown signal: {e}");
        }
        info!("Shutdown signal received, starting graceful shutdown...");

        running.shutdown().await;
        info!("Controller shutdown complete");
        Ok(())
    }
}

/// Handle to a started [`App`].
#[derive(Debug)]
pub struct RunningApp {
    bus: EventBus,
    store: Arc<MemoryStore>,
    handle: ControllerHandle,
}

impl RunningApp {
    #[must_use]
    pub const fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Stops the workers, then closes the watch channels.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
        let closed = self.bus.shutdown();
        info!(channels = closed, "Event bus closed");
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
