//! # Metrics Collection
//!
//! Counters for cache and key rotation activity, emitted through the `metrics`
//! facade. Nothing is recorded unless the host installs a recorder, for example
//! through [`init_metrics`].

use crate::config::MetricsConfig;
use crate::errors::{Error, Result};
use crate::secrets::ErrorKind;
use ::tracing::info;
use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Why the cache went to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The entry had never been populated.
    Initial,
    /// The refresh interval had elapsed.
    Stale,
    /// The caller asked for a refresh.
    Forced,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Stale => "stale",
            Self::Forced => "forced",
        }
    }
}

/// Metrics recorder for cache and rotation events
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record a read served from the cache without a store round-trip
    pub fn record_cache_hit(&self, stage: &str) {
        let labels = [("stage", stage.to_string())];
        counter!("secrets_cache_hits_total", &labels).increment(1);
    }

    /// Record a successful refresh of a cache entry
    pub fn record_refresh(&self, trigger: RefreshTrigger) {
        let labels = [("trigger", trigger.as_str().to_string())];
        counter!("secrets_cache_refreshes_total", &labels).increment(1);
    }

    /// Record a refresh that failed and left the entry untouched
    pub fn record_refresh_failure(&self, trigger: RefreshTrigger, kind: ErrorKind) {
        let labels =
            [("trigger", trigger.as_str().to_string()), ("kind", kind.as_str().to_string())];
        counter!("secrets_cache_refresh_failures_total", &labels).increment(1);
    }

    /// Record the outcome of a rotation check that reached the store
    pub fn record_rotation_check(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("key_rotation_checks_total", &labels).increment(1);
    }

    /// Record installation of a new active signing key
    pub fn record_key_rotated(&self) {
        counter!("key_rotations_total").increment(1);
    }

    /// Register metric descriptions with the installed recorder
    pub fn describe(&self) {
        describe_counter!(
            "secrets_cache_hits_total",
            Unit::Count,
            "Secret reads served from the cache"
        );
        describe_counter!(
            "secrets_cache_refreshes_total",
            Unit::Count,
            "Successful cache entry refreshes by trigger"
        );
        describe_counter!(
            "secrets_cache_refresh_failures_total",
            Unit::Count,
            "Failed cache entry refreshes by trigger and error kind"
        );
        describe_counter!(
            "key_rotation_checks_total",
            Unit::Count,
            "Signing key rotation checks that reached the store, by outcome"
        );
        describe_counter!("key_rotations_total", Unit::Count, "Signing keys rotated");
    }
}

/// Install the Prometheus exporter when a bind address is configured
pub fn init_metrics(config: &MetricsConfig) -> Result<()> {
    let Some(bind_address) = config.bind_address.as_deref() else {
        return Ok(());
    };

    let socket_addr: SocketAddr = bind_address.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", bind_address, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    MetricsRecorder::new().describe();
    info!(metrics_addr = %socket_addr, "Metrics exporter initialized");
    Ok(())
}
