//! Tracing subscriber initialization.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::logging::LoggingConfig;

/// Initialize the global tracing subscriber from logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Initialization
/// is idempotent: a second call (e.g. from another test binary in the
/// same process) is a no-op.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already initialized");
    }
}
