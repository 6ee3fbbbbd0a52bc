//! Version-staged secret retrieval and caching.
//!
//! # Architecture
//!
//! Everything is built around the [`SecretsClient`] trait: read the string value
//! of a named secret at a [`VersionStage`]. Store clients implement it with one
//! round-trip per call; [`CachedSecretsClient`] implements it by wrapping another
//! client and serving reads from memory until the entry goes stale.
//!
//! - [`AwsSecretsManagerClient`] (feature `aws`): AWS Secrets Manager
//! - [`InMemorySecretStore`]: in-process store with the same staging semantics,
//!   for development and tests
//!
//! # Composition Example
//!
//! ```rust,ignore
//! use secrets_cache::secrets::{AwsSecretsManagerClient, CachedSecretsClient, SecretsClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = AwsSecretsManagerClient::from_config(&config.store).await?;
//! let cached = Arc::new(CachedSecretsClient::new(store, Duration::from_secs(3600)));
//!
//! // Consumers only see the trait
//! let client: Arc<dyn SecretsClient> = cached.clone();
//! let password = client.get_current_secret_string("prod/db").await?;
//! ```
//!
//! # Security
//!
//! Values are returned as [`SecretString`], which redacts itself in logs and
//! serialized output and zeroizes on drop.

#[cfg(feature = "aws")]
pub mod aws;
pub mod cached;
pub mod client;
pub mod error;
pub mod memory;
pub mod stage;
pub mod types;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManagerClient;
pub use cached::{CachedSecretsClient, DEFAULT_REFRESH_INTERVAL};
pub use client::{validate_name, SecretsClient};
pub use error::{ErrorKind, Result, RetrievalError};
pub use memory::InMemorySecretStore;
pub use stage::VersionStage;
pub use types::SecretString;
