//! Tracing subscriber setup for applications embedding `Tabula`.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host application, which can call [`init_logging`] with the
//! `[logging]` section of its configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Builds the filter for a logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone()))
}

/// Installs a global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`Error::Config`] if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = if config.format == "compact" {
        registry.with(fmt::layer().compact()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    installed.map_err(|e| Error::Config(format!("logging already initialized: {e}")))
}
