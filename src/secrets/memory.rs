//! In-process secrets store.
//!
//! Models the store's version staging: writing a new value promotes it to
//! `AWSCURRENT` and demotes the old current value to `AWSPREVIOUS`. Used for local
//! development and as the store behind the cache in tests, where the fetch
//! counters and injected failures make refresh behaviour observable.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::client::{validate_name, SecretsClient};
use super::error::{ErrorKind, Result, RetrievalError};
use super::stage::VersionStage;
use super::types::SecretString;

#[derive(Clone)]
enum StoredValue {
    Text(SecretString),
    Binary(Vec<u8>),
}

/// In-memory [`SecretsClient`] with AWS-style version staging.
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: DashMap<String, HashMap<VersionStage, StoredValue>>,
    failures: DashMap<(String, Option<VersionStage>), ErrorKind>,
    fetches: DashMap<(String, VersionStage), usize>,
    total_fetches: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new string version, demoting the current one to `PREVIOUS`.
    pub fn put_string(&self, name: &str, value: impl Into<String>) {
        self.put(name, StoredValue::Text(SecretString::new(value)));
    }

    /// Store a new binary-only version, demoting the current one to `PREVIOUS`.
    pub fn put_binary(&self, name: &str, value: impl Into<Vec<u8>>) {
        self.put(name, StoredValue::Binary(value.into()));
    }

    /// Stage a pending version without touching `CURRENT` or `PREVIOUS`.
    pub fn put_pending(&self, name: &str, value: impl Into<String>) {
        self.secrets
            .entry(name.to_string())
            .or_default()
            .insert(VersionStage::Pending, StoredValue::Text(SecretString::new(value)));
    }

    fn put(&self, name: &str, value: StoredValue) {
        let mut versions = self.secrets.entry(name.to_string()).or_default();
        if let Some(current) = versions.remove(&VersionStage::Current) {
            versions.insert(VersionStage::Previous, current);
        }
        versions.remove(&VersionStage::Pending);
        versions.insert(VersionStage::Current, value);
    }

    /// Remove a secret and all of its versions.
    pub fn delete(&self, name: &str) {
        self.secrets.remove(name);
    }

    /// Make every fetch of `name` fail with `kind` until cleared.
    pub fn fail_with(&self, name: &str, kind: ErrorKind) {
        self.failures.insert((name.to_string(), None), kind);
    }

    /// Make fetches of one stage of `name` fail with `kind` until cleared.
    pub fn fail_stage_with(&self, name: &str, stage: VersionStage, kind: ErrorKind) {
        self.failures.insert((name.to_string(), Some(stage)), kind);
    }

    /// Remove every injected failure for `name`.
    pub fn clear_failures(&self, name: &str) {
        self.failures.retain(|(failing, _), _| failing != name);
    }

    /// Delay every fetch, so concurrent callers overlap.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = Some(latency);
    }

    /// Number of fetches of one stage of `name` that reached the store.
    pub fn fetch_count(&self, name: &str, stage: VersionStage) -> usize {
        self.fetches.get(&(name.to_string(), stage)).map(|count| *count).unwrap_or(0)
    }

    /// Number of fetches of any secret that reached the store.
    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, name: &str, stage: VersionStage) -> Option<ErrorKind> {
        self.failures
            .get(&(name.to_string(), Some(stage)))
            .or_else(|| self.failures.get(&(name.to_string(), None)))
            .map(|kind| *kind)
    }
}

#[async_trait]
impl SecretsClient for InMemorySecretStore {
    async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
        validate_name(name)?;

        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        *self.fetches.entry((name.to_string(), stage)).or_insert(0) += 1;
        self.total_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = self.injected_failure(name, stage) {
            return Err(RetrievalError::new(kind, name, "injected failure"));
        }

        let versions = self
            .secrets
            .get(name)
            .ok_or_else(|| RetrievalError::not_found(name, "secret does not exist"))?;

        match versions.get(&stage) {
            Some(StoredValue::Text(value)) => Ok(value.clone()),
            Some(StoredValue::Binary(bytes)) => Err(RetrievalError::invalid_state(
                name,
                format!("{} version holds {} bytes of binary data", stage, bytes.len()),
            )),
            None => Err(RetrievalError::not_found(name, format!("no {} version", stage))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_demotes_current_to_previous() {
        let store = InMemorySecretStore::new();
        store.put_string("app", "v1");
        store.put_string("app", "v2");

        assert_eq!(store.get_current_secret_string("app").await.unwrap(), "v2");
        assert_eq!(store.get_previous_secret_string("app").await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_missing_previous_is_not_found() {
        let store = InMemorySecretStore::new();
        store.put_string("app", "only");

        let err = store.get_previous_secret_string("app").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_binary_value_is_invalid_state() {
        let store = InMemorySecretStore::new();
        store.put_binary("blob", vec![0xde, 0xad]);

        let err = store.get_current_secret_string("blob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.detail(), "AWSCURRENT version holds 2 bytes of binary data");
    }

    #[tokio::test]
    async fn test_injected_failures_and_counters() {
        let store = InMemorySecretStore::new();
        store.put_string("app", "v1");
        store.fail_stage_with("app", VersionStage::Previous, ErrorKind::AccessDenied);

        assert!(store.get_current_secret_string("app").await.is_ok());
        let err = store.get_previous_secret_string("app").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);

        store.fail_with("app", ErrorKind::Transport);
        let err = store.get_current_secret_string("app").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        store.clear_failures("app");
        assert!(store.get_current_secret_string("app").await.is_ok());

        assert_eq!(store.fetch_count("app", VersionStage::Current), 3);
        assert_eq!(store.fetch_count("app", VersionStage::Previous), 1);
        assert_eq!(store.total_fetches(), 4);
    }

    #[tokio::test]
    async fn test_pending_does_not_disturb_current() {
        let store = InMemorySecretStore::new();
        store.put_string("app", "v1");
        store.put_pending("app", "v2-pending");

        assert_eq!(store.get_secret_string("app", VersionStage::Pending).await.unwrap(), "v2-pending");
        assert_eq!(store.get_current_secret_string("app").await.unwrap(), "v1");
    }
}
