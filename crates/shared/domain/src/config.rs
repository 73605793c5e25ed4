use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level controller configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerConfigInner {
    pub controller: RuntimeConfig,
    pub verification: VerificationConfig,
    pub logging: LoggingConfig,
    /// Optional JSON manifest applied to the store on startup.
    pub seed: Option<PathBuf>,
}

/// Thin Arc-wrapped config for inexpensive cloning into workers.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    #[serde(flatten, default)]
    inner: Arc<ControllerConfigInner>,
}

impl Deref for ControllerConfig {
    type Target = ControllerConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ControllerConfig {
    fn deref_mut(&mut self) -> &mut ControllerConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Work queue and reconcile loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of concurrent reconcile workers.
    pub workers: usize,
    /// Delay before a failed reconcile is retried.
    pub requeue_delay_ms: u64,
    /// Attempts of the read-modify-write loop on the shared `Domain` before giving up.
    pub conflict_retries: u32,
    /// Finalizer marker placed on registrations.
    pub finalizer: String,
    /// Capacity of the watch channels.
    pub queue_capacity: usize,
}

impl RuntimeConfig {
    #[must_use]
    pub const fn requeue_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Label prepended to the hostname to form the TXT record name.
    pub record_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Console format: `compact`, `pretty` or `json`.
    pub format: String,
    /// Directive filter, e.g. `hostbind_registration=debug,info`.
    pub filter: Option<String>,
    /// Directory for rolling log files. Console only when unset.
    pub path: Option<PathBuf>,
    pub json_files: bool,
    pub max_files: usize,
}

// --- Default ---

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            requeue_delay_ms: 5_000,
            conflict_retries: 5,
            finalizer: "hostbind.io/domain-registration".to_owned(),
            queue_capacity: 1_024,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { record_prefix: "_hostbind-verification".to_owned() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            filter: None,
            path: None,
            json_files: false,
            max_files: 10,
        }
    }
}
