use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// File loaded when no explicit path is given (any format the `config` crate detects).
pub const DEFAULT_CONFIG_FILE: &str = "controller";

/// Prefix of environment overrides, e.g. `HOSTBIND__CONTROLLER__WORKERS`.
pub const ENV_PREFIX: &str = "HOSTBIND";

/// Custom error type for config loading.
#[hostbind_derive::hostbind_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// Layers, lowest precedence first:
/// 1. **Base File**: an explicit `path` must exist. Without one, the `controller` file in the
///    working directory is read when present and skipped otherwise.
/// 2. **Environment Overrides**: variables prefixed with `HOSTBIND__`. Nested structures use
///    double underscores (e.g., `HOSTBIND__CONTROLLER__WORKERS` maps to `controller.workers`).
///
/// # Errors
/// This function will return an error if:
/// * An explicitly given configuration file cannot be found or parsed.
/// * The merged content does not match the structure of type `T`.
///
/// # Example
/// ```rust
/// use hostbind_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     workers: usize,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
