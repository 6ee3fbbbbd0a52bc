//! # Configuration Settings
//!
//! Defines the configuration structure for the secrets cache, the key rotation
//! controller and the database credentials provider.

use crate::db::DatabaseEngine;
use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Field of the signing-key secret read when none is configured.
pub const DEFAULT_KEY_FIELD: &str = "DJANGO_SECRET_KEY";

/// Default refresh interval in seconds for both the cache and rotation checks.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 3600;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Secrets store connection
    #[validate(nested)]
    pub store: StoreConfig,

    /// Cache refresh policy
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Signing key rotation, disabled when absent
    #[validate(nested)]
    pub rotation: Option<RotationConfig>,

    /// Database credentials secret, disabled when absent
    #[validate(nested)]
    pub database: Option<DatabaseConfig>,

    #[validate(nested)]
    pub logging: LoggingConfig,

    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.store.validate_credentials()?;
        Ok(())
    }

    /// Rotation settings, or a configuration error naming what is missing.
    pub fn require_rotation(&self) -> Result<&RotationConfig> {
        self.rotation
            .as_ref()
            .ok_or_else(|| Error::config("rotation.secret_id is required for key rotation"))
    }

    /// Database settings, or a configuration error naming what is missing.
    pub fn require_database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::config("database.secret_id is required for database credentials"))
    }
}

/// Secrets store connection settings
///
/// Static credentials are used when both `access_key_id` and
/// `secret_access_key` are set; otherwise the default provider chain is used,
/// with `profile_name` when given.
#[derive(Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    /// Store region, e.g. `ap-southeast-1`
    #[validate(length(min = 1, message = "Region cannot be empty"))]
    pub region_name: Option<String>,

    /// Named profile from the shared credentials file
    #[validate(length(min = 1, message = "Profile name cannot be empty"))]
    pub profile_name: Option<String>,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<SecretString>,

    pub session_token: Option<SecretString>,

    /// Endpoint override, for local store emulators
    #[validate(url(message = "Endpoint URL must be a valid URL"))]
    pub endpoint_url: Option<String>,
}

impl StoreConfig {
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    fn validate_credentials(&self) -> Result<()> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(Error::config(
                "store.secret_access_key is required when store.access_key_id is set",
            )),
            (None, Some(_)) => Err(Error::config(
                "store.access_key_id is required when store.secret_access_key is set",
            )),
            _ if self.session_token.is_some() && !self.has_static_credentials() => Err(
                Error::config("store.session_token requires static store credentials"),
            ),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("region_name", &self.region_name)
            .field("profile_name", &self.profile_name)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[REDACTED]"))
            .field("secret_access_key", &self.secret_access_key)
            .field("session_token", &self.session_token)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Cache refresh policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Age in seconds at which a cached secret is refreshed
    #[validate(range(min = 1, message = "Refresh interval must be at least 1 second"))]
    pub refresh_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS }
    }
}

impl CacheConfig {
    /// Get the refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

/// Signing key rotation settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RotationConfig {
    /// Name or ARN of the secret holding the signing key
    #[validate(length(min = 1, message = "Rotation secret_id is required"))]
    pub secret_id: String,

    /// Field of the JSON secret holding the key
    #[validate(length(min = 1, message = "Rotation field_name cannot be empty"))]
    pub field_name: String,

    /// Minimum seconds between checks against the store
    #[validate(range(min = 1, message = "Rotation interval must be at least 1 second"))]
    pub refresh_interval_seconds: u64,

    /// Keep the replaced key as a fallback for verification
    pub retain_fallback: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            field_name: DEFAULT_KEY_FIELD.to_string(),
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            retain_fallback: true,
        }
    }
}

impl RotationConfig {
    /// Rotation settings for `secret_id` with every other field defaulted.
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self { secret_id: secret_id.into(), ..Self::default() }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Set the check interval, rounded up to whole seconds with a floor of one.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        let partial = u64::from(interval.subsec_nanos() > 0);
        self.refresh_interval_seconds = interval.as_secs().saturating_add(partial).max(1);
        self
    }

    pub fn with_retain_fallback(mut self, retain_fallback: bool) -> Self {
        self.retain_fallback = retain_fallback;
        self
    }

    /// Get the check interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

/// Database credentials secret
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Name or ARN of the JSON secret holding the connection parameters
    #[validate(length(min = 1, message = "Database secret_id is required"))]
    pub secret_id: String,

    pub engine: DatabaseEngine,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Metrics exporter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus listener address; no exporter when unset
    pub bind_address: Option<String>,
}
