//! # Configuration Management
//!
//! Layered configuration: an optional file (TOML, YAML or JSON, chosen by
//! extension) overridden by `SECRETS_CACHE_*` environment variables. Nested keys
//! use `__`, e.g. `SECRETS_CACHE_ROTATION__SECRET_ID`.

pub mod settings;

pub use settings::{
    AppConfig, CacheConfig, DatabaseConfig, LoggingConfig, MetricsConfig, RotationConfig,
    StoreConfig, DEFAULT_KEY_FIELD, DEFAULT_REFRESH_INTERVAL_SECONDS,
};

use crate::Result;
use std::path::Path;

/// Prefix of environment variables read by [`AppConfig::load`].
pub const ENV_PREFIX: &str = "SECRETS_CACHE";

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// A configured `path` must exist. Errors from reading, parsing or
    /// validation are all [`Error::Config`](crate::Error::Config).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(file = ?path, "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
