//! # Secrets Cache
//!
//! Client-side caching for a version-staged secrets store, plus the consumers
//! that depend on it: signing key rotation and database credentials.
//!
//! ## Architecture
//!
//! ```text
//! Store Client ──▶ CachedSecretsClient ──▶ DatabaseCredentials
//!      │
//!      └──────────▶ KeyRotationController ──▶ Signer / axum middleware
//! ```
//!
//! ## Core Components
//!
//! - **[`secrets`]**: the `SecretsClient` trait, store clients, and the caching
//!   decorator with its staleness-based refresh policy
//! - **[`rotation`]**: signing key rotation with a single fallback key
//! - **[`signing`]**: HMAC signing that verifies against active and fallback keys
//! - **[`db`]**: database connection parameters from a JSON secret
//! - **[`config`]**, **[`observability`]**, **[`errors`]**: ambient concerns
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use secrets_cache::secrets::{CachedSecretsClient, InMemorySecretStore, VersionStage};
//! use std::time::Duration;
//!
//! let store = InMemorySecretStore::new();
//! store.put_string("app/key", "v1");
//! let cache = CachedSecretsClient::new(store, Duration::from_secs(3600));
//! let value = cache.get("app/key", VersionStage::Current, false).await?;
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod observability;
pub mod rotation;
pub mod secrets;
pub mod signing;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};
pub use rotation::KeyRotationController;
pub use secrets::{CachedSecretsClient, SecretString, SecretsClient, VersionStage};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
