//! Core retrieval trait shared by store clients and the cache.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::{Result, RetrievalError};
use super::stage::VersionStage;
use super::types::SecretString;

/// Read access to a version-staged secrets store.
///
/// Implemented by the network-facing store clients and by
/// [`CachedSecretsClient`](super::CachedSecretsClient), which wraps another
/// implementation. Consumers such as the key rotation controller depend only on
/// this trait and cannot tell the two apart.
///
/// # Contract
///
/// - `name` must be non-empty; an empty name fails with
///   [`ErrorKind::InvalidState`](super::ErrorKind::InvalidState)
/// - A secret without a string value fails with `InvalidState`
/// - A missing secret or missing version stage fails with `NotFound`
/// - Implementations do not retry and MUST NOT log secret values
///
/// # Example Implementation
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use secrets_cache::secrets::{Result, SecretString, SecretsClient, VersionStage};
///
/// struct FixedStore;
///
/// #[async_trait]
/// impl SecretsClient for FixedStore {
///     async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
///         Ok(SecretString::new(format!("{name}@{stage}")))
///     }
/// }
/// ```
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Retrieve the string value of a secret at the given version stage.
    ///
    /// # Arguments
    ///
    /// * `name` - Secret name or ARN
    /// * `stage` - Version stage to read
    ///
    /// # Errors
    ///
    /// Any [`RetrievalError`] reported by the store.
    async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString>;

    /// Retrieve the `CURRENT` version of a secret.
    async fn get_current_secret_string(&self, name: &str) -> Result<SecretString> {
        self.get_secret_string(name, VersionStage::Current).await
    }

    /// Retrieve the `PREVIOUS` version of a secret.
    async fn get_previous_secret_string(&self, name: &str) -> Result<SecretString> {
        self.get_secret_string(name, VersionStage::Previous).await
    }
}

#[async_trait]
impl<T: SecretsClient + ?Sized> SecretsClient for Arc<T> {
    async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
        (**self).get_secret_string(name, stage).await
    }
}

/// Reject an empty secret name before any store round-trip.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RetrievalError::invalid_state(name, "secret name must not be empty"));
    }
    Ok(())
}
