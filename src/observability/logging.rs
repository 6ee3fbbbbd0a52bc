//! # Structured Logging
//!
//! The library logs through `tracing` macros only and never installs a
//! subscriber. Hosts either install their own or call [`init_logging`] once at
//! startup.

use crate::config::{AppConfig, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the process-wide fmt subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this when a
/// subscriber is already installed leaves the existing one in place.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}

/// Log the effective configuration, without credentials.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        region = config.store.region_name.as_deref().unwrap_or("<default>"),
        profile = config.store.profile_name.as_deref().unwrap_or("<default>"),
        static_credentials = config.store.has_static_credentials(),
        refresh_interval_secs = config.cache.refresh_interval_seconds,
        rotation_enabled = config.rotation.is_some(),
        database_enabled = config.database.is_some(),
        "Secrets cache configuration"
    );
}
