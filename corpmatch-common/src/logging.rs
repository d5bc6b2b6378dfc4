//! Logging initialisation
//!
//! Library code only emits `tracing` events. Whoever embeds the resolver
//! calls [`init_tracing`] once to get formatted output on stderr.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG` or the configured level
///
/// Returns `Ok(true)` when the subscriber was installed and `Ok(false)` when a
/// global subscriber already existed (e.g. a second call from another test).
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            Error::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(level = %config.level, "Tracing initialised");
    }
    Ok(installed)
}
