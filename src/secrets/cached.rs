//! Cached secrets client with a staleness-based refresh policy.
//!
//! Wraps any [`SecretsClient`] with a per-secret cache entry holding the last
//! known `AWSCURRENT` and `AWSPREVIOUS` values and the time they were fetched.
//!
//! # Refresh policy
//!
//! - An entry is refreshed when it has never been populated, when
//!   `now - last_refreshed_at >= refresh_interval`, or when the caller forces it
//! - A refresh fetches both cached stages and replaces them together with the
//!   refresh timestamp; a failed refresh leaves the entry exactly as it was and
//!   returns the error
//! - `AWSPENDING` is never cached and always goes to the store
//!
//! # Concurrency
//!
//! Each secret name has its own async mutex. Callers asking for the same name
//! while a refresh is in flight wait for it and then read the fresh values, so a
//! stale window costs at most one upstream refresh. Callers for other names never
//! wait on that network round-trip.
//!
//! # Example
//!
//! ```rust,ignore
//! use secrets_cache::secrets::{CachedSecretsClient, InMemorySecretStore, VersionStage};
//! use std::time::Duration;
//!
//! let store = InMemorySecretStore::new();
//! store.put_string("app/signing-key", "v1");
//!
//! let client = CachedSecretsClient::new(store, Duration::from_secs(3600));
//!
//! // First call fetches from the store, later calls within the hour do not
//! let key = client.get("app/signing-key", VersionStage::Current, false).await?;
//!
//! // After rotating on the store side
//! client.refresh_now("app/signing-key").await?;
//! ```

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::client::{validate_name, SecretsClient};
use super::error::{ErrorKind, Result, RetrievalError};
use super::stage::VersionStage;
use super::types::SecretString;
use crate::observability::{MetricsRecorder, RefreshTrigger};

/// Default refresh interval: one hour.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Cached state of one secret name.
///
/// A stage maps to the error the store reported for it when that error describes
/// the version rather than the request (missing or non-string), so a cached
/// read fails the same way a direct read would.
#[derive(Default)]
struct CacheEntry {
    values: HashMap<VersionStage, Result<SecretString>>,
    last_refreshed_at: Option<Instant>,
}

impl CacheEntry {
    fn refresh_trigger(&self, interval: Duration, force_refresh: bool) -> Option<RefreshTrigger> {
        match self.last_refreshed_at {
            _ if force_refresh => Some(RefreshTrigger::Forced),
            None => Some(RefreshTrigger::Initial),
            Some(at) if at.elapsed() >= interval => Some(RefreshTrigger::Stale),
            Some(_) => None,
        }
    }

    fn value(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
        match self.values.get(&stage) {
            Some(slot) => slot.clone(),
            None => Err(RetrievalError::not_found(name, format!("no {} version cached", stage))),
        }
    }
}

/// Caching decorator over a [`SecretsClient`].
///
/// Implements [`SecretsClient`] itself, serving reads through
/// [`get`](CachedSecretsClient::get) without forcing a refresh.
///
/// # Thread Safety
///
/// Share it across tasks behind an `Arc`. The entry map is a `DashMap`, and each
/// entry is guarded by its own `tokio::sync::Mutex`.
pub struct CachedSecretsClient<C: SecretsClient> {
    inner: C,
    entries: DashMap<String, Arc<Mutex<CacheEntry>>>,
    refresh_interval: Duration,
    populated: AtomicUsize,
    metrics: MetricsRecorder,
}

impl<C: SecretsClient> CachedSecretsClient<C> {
    /// Creates a new cached client.
    ///
    /// # Arguments
    ///
    /// * `inner` - The store client to wrap
    /// * `refresh_interval` - Age at which a cached entry is considered stale
    pub fn new(inner: C, refresh_interval: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            refresh_interval,
            populated: AtomicUsize::new(0),
            metrics: MetricsRecorder::new(),
        }
    }

    /// Creates a cached client with the default one-hour refresh interval.
    pub fn with_default_interval(inner: C) -> Self {
        Self::new(inner, DEFAULT_REFRESH_INTERVAL)
    }

    /// Read a secret at `stage`, refreshing the entry first when required.
    ///
    /// # Arguments
    ///
    /// * `name` - Secret name or ARN
    /// * `stage` - Version stage to read; `Pending` bypasses the cache
    /// * `force_refresh` - Refresh even if the entry is fresh; resets the
    ///   staleness clock on success
    ///
    /// # Errors
    ///
    /// - The store's error when a required refresh fails; the cached values
    ///   stay as they were
    /// - `NotFound` when the stage is absent after a successful refresh
    pub async fn get(
        &self,
        name: &str,
        stage: VersionStage,
        force_refresh: bool,
    ) -> Result<SecretString> {
        validate_name(name)?;

        if !stage.is_cached() {
            tracing::debug!(secret = %name, stage = %stage, "Fetching uncached version stage");
            return self.inner.get_secret_string(name, stage).await;
        }

        let entry = self.entry(name);
        let mut entry = entry.lock().await;

        match entry.refresh_trigger(self.refresh_interval, force_refresh) {
            Some(trigger) => self.refresh_entry(name, &mut entry, trigger).await?,
            None => {
                tracing::debug!(secret = %name, stage = %stage, "Cache hit for secret");
                self.metrics.record_cache_hit(stage.as_str());
            }
        }

        entry.value(name, stage)
    }

    /// Read the `AWSCURRENT` version.
    pub async fn get_current(&self, name: &str, force_refresh: bool) -> Result<SecretString> {
        self.get(name, VersionStage::Current, force_refresh).await
    }

    /// Read the `AWSPREVIOUS` version.
    pub async fn get_previous(&self, name: &str, force_refresh: bool) -> Result<SecretString> {
        self.get(name, VersionStage::Previous, force_refresh).await
    }

    /// Refresh all cached stages of `name` from the store right away.
    ///
    /// Waits for any in-flight refresh of the same name first. On failure the
    /// entry is left intact and the error is returned.
    pub async fn refresh_now(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let entry = self.entry(name);
        let mut entry = entry.lock().await;
        self.refresh_entry(name, &mut entry, RefreshTrigger::Forced).await
    }

    /// Refresh every name holding cached values.
    ///
    /// Names whose first lookup failed are skipped. Each failure is logged; the
    /// first one is returned after all names have been attempted.
    pub async fn refresh_all(&self) -> Result<()> {
        let names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();

        let mut first_error = None;
        let mut refreshed = 0;
        let mut failed = 0;
        for name in &names {
            let entry = self.entry(name);
            let mut entry = entry.lock().await;
            // Lookups that never succeeded have nothing to refresh
            if entry.last_refreshed_at.is_none() {
                continue;
            }
            match self.refresh_entry(name, &mut entry, RefreshTrigger::Forced).await {
                Ok(()) => refreshed += 1,
                Err(e) => {
                    tracing::error!(secret = %name, error = %e, "Failed to refresh secret");
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => {
                tracing::info!(count = refreshed, "Refreshed all cached secrets");
                Ok(())
            }
            Some(e) => {
                tracing::warn!(failed, refreshed, "Some cached secrets failed to refresh");
                Err(e)
            }
        }
    }

    /// Number of secret names holding cached values.
    pub fn cache_size(&self) -> usize {
        self.populated.load(Ordering::Relaxed)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// The wrapped store client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn entry(&self, name: &str) -> Arc<Mutex<CacheEntry>> {
        if let Some(entry) = self.entries.get(name) {
            return Arc::clone(entry.value());
        }
        Arc::clone(self.entries.entry(name.to_string()).or_default().value())
    }

    async fn refresh_entry(
        &self,
        name: &str,
        entry: &mut CacheEntry,
        trigger: RefreshTrigger,
    ) -> Result<()> {
        tracing::debug!(secret = %name, trigger = trigger.as_str(), "Refreshing cached secret");

        match self.fetch_cached_stages(name).await {
            Ok(values) => {
                entry.values = values;
                if entry.last_refreshed_at.replace(Instant::now()).is_none() {
                    self.populated.fetch_add(1, Ordering::Relaxed);
                }
                self.metrics.record_refresh(trigger);
                tracing::debug!(secret = %name, trigger = trigger.as_str(), "Refreshed cached secret");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_refresh_failure(trigger, e.kind());
                tracing::warn!(
                    secret = %name,
                    trigger = trigger.as_str(),
                    kind = e.kind().as_str(),
                    error = %e,
                    "Secret refresh failed, keeping cached values"
                );
                Err(e)
            }
        }
    }

    /// Fetch every cached stage; only a complete set is returned.
    async fn fetch_cached_stages(
        &self,
        name: &str,
    ) -> Result<HashMap<VersionStage, Result<SecretString>>> {
        let [current_stage, previous_stage] = VersionStage::CACHED;
        let (current, previous) = tokio::join!(
            self.inner.get_secret_string(name, current_stage),
            self.inner.get_secret_string(name, previous_stage),
        );

        let current = current?;
        let previous = match previous {
            Ok(value) => Ok(value),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::InvalidState) => Err(e),
            Err(e) => return Err(e),
        };

        Ok(HashMap::from([(current_stage, Ok(current)), (previous_stage, previous)]))
    }
}

#[async_trait]
impl<C: SecretsClient> SecretsClient for CachedSecretsClient<C> {
    async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
        self.get(name, stage, false).await
    }
}
