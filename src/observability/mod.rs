//! # Observability
//!
//! Structured logging setup and metric counters for cache and rotation events.
//! `tracing` is the logging port for the whole crate: components emit events
//! through its macros and the host decides where they go.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{init_metrics, MetricsRecorder, RefreshTrigger};
