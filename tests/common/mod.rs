//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use secrets_cache::secrets::{CachedSecretsClient, InMemorySecretStore};

pub const HOUR: Duration = Duration::from_secs(3600);

/// Store holding `versions` for `name`, oldest first, so the last one is CURRENT.
pub fn store_with(name: &str, versions: &[&str]) -> Arc<InMemorySecretStore> {
    let store = Arc::new(InMemorySecretStore::new());
    for value in versions {
        store.put_string(name, *value);
    }
    store
}

/// Cache over a shared store, so tests can keep mutating and inspecting the store.
pub fn cached(
    store: &Arc<InMemorySecretStore>,
    interval: Duration,
) -> CachedSecretsClient<Arc<InMemorySecretStore>> {
    CachedSecretsClient::new(Arc::clone(store), interval)
}

/// JSON payload of a signing key secret.
pub fn key_payload(key: &str) -> String {
    serde_json::json!({ "DJANGO_SECRET_KEY": key }).to_string()
}
