//! Signing key rotation controller.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::RotationConfig;
use crate::observability::MetricsRecorder;
use crate::secrets::{self, RetrievalError, SecretString, SecretsClient};

/// Maximum number of previous keys kept for verification.
pub const MAX_FALLBACK_KEYS: usize = 1;

/// Snapshot of the signing keys in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    /// Key used to sign new values.
    pub active: SecretString,
    /// Keys still accepted when verifying, newest first.
    pub fallbacks: Vec<SecretString>,
}

impl KeySet {
    /// Active key followed by the fallbacks, in verification order.
    pub fn iter(&self) -> impl Iterator<Item = &SecretString> {
        std::iter::once(&self.active).chain(self.fallbacks.iter())
    }
}

/// What a call to [`KeyRotationController::check_and_rotate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The check interval had not elapsed; the store was not consulted.
    Skipped,
    /// The store holds the active key.
    Unchanged,
    /// A new active key was installed.
    Rotated,
    /// The key could not be read; the keys in use are untouched.
    Failed,
}

impl RotationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Unchanged => "unchanged",
            Self::Rotated => "rotated",
            Self::Failed => "failed",
        }
    }
}

struct RotationState {
    active: SecretString,
    fallbacks: Vec<SecretString>,
    last_rotated_at: Option<DateTime<Utc>>,
}

/// Keeps an application signing key in step with a secret in the store.
///
/// At most once per check interval, [`check_and_rotate`](Self::check_and_rotate)
/// reads a JSON secret, takes the configured field as the candidate key, and if
/// it differs from the active key installs it, keeping the replaced key as the
/// single fallback. Values signed just before a rotation stay verifiable.
///
/// The interval gate is claimed before the fetch. A failing store is therefore
/// consulted once per interval, not on every call.
///
/// Failures never reach the caller: they are logged and the keys in use stay
/// as they were.
pub struct KeyRotationController {
    client: Arc<dyn SecretsClient>,
    config: RotationConfig,
    state: RwLock<RotationState>,
    last_checked_at: Mutex<Instant>,
    metrics: MetricsRecorder,
}

impl KeyRotationController {
    /// Create a controller starting from `initial_key`.
    ///
    /// The check interval starts now, so the first store read happens one
    /// interval after construction.
    pub fn new(
        client: Arc<dyn SecretsClient>,
        config: RotationConfig,
        initial_key: SecretString,
    ) -> Self {
        Self {
            client,
            config,
            state: RwLock::new(RotationState {
                active: initial_key,
                fallbacks: Vec::with_capacity(MAX_FALLBACK_KEYS),
                last_rotated_at: None,
            }),
            last_checked_at: Mutex::new(Instant::now()),
            metrics: MetricsRecorder::new(),
        }
    }

    /// Create a controller whose initial key is read from the store.
    ///
    /// # Errors
    ///
    /// The retrieval error when the key cannot be read. Unlike later checks,
    /// a host cannot start without a key.
    pub async fn from_store(
        client: Arc<dyn SecretsClient>,
        config: RotationConfig,
    ) -> crate::Result<Self> {
        let initial_key = read_key(client.as_ref(), &config).await?;
        info!(
            secret = %config.secret_id,
            key_fingerprint = %initial_key.fingerprint(),
            "Loaded initial signing key"
        );
        Ok(Self::new(client, config, initial_key))
    }

    /// Check the store for a new key if the check interval has elapsed.
    pub async fn check_and_rotate(&self) -> RotationOutcome {
        if !self.claim_check() {
            return RotationOutcome::Skipped;
        }
        self.check().await
    }

    /// Check the store now, regardless of the interval, and restart the interval.
    pub async fn rotate_now(&self) -> RotationOutcome {
        *self.last_checked_at.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
        self.check().await
    }

    /// Current active and fallback keys.
    pub fn current_keys(&self) -> KeySet {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        KeySet { active: state.active.clone(), fallbacks: state.fallbacks.clone() }
    }

    /// When the active key was last replaced; `None` if never.
    pub fn last_rotated_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).last_rotated_at
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Run [`check_and_rotate`](Self::check_and_rotate) on a fixed period until
    /// the returned task is aborted.
    pub fn spawn(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.check_and_rotate().await;
            }
        })
    }

    fn claim_check(&self) -> bool {
        let mut last_checked_at = self.last_checked_at.lock().unwrap_or_else(|e| e.into_inner());
        if last_checked_at.elapsed() < self.config.refresh_interval() {
            return false;
        }
        *last_checked_at = Instant::now();
        true
    }

    async fn check(&self) -> RotationOutcome {
        let outcome = match read_key(self.client.as_ref(), &self.config).await {
            Ok(candidate) => self.install(candidate),
            Err(e) => {
                warn!(
                    secret = %self.config.secret_id,
                    kind = e.kind().as_str(),
                    error = %e,
                    "Signing key check failed, keeping current keys"
                );
                RotationOutcome::Failed
            }
        };
        self.metrics.record_rotation_check(outcome.as_str());
        outcome
    }

    fn install(&self, candidate: SecretString) -> RotationOutcome {
        if self.state.read().unwrap_or_else(|e| e.into_inner()).active == candidate {
            debug!(secret = %self.config.secret_id, "Signing key unchanged");
            return RotationOutcome::Unchanged;
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // Another check may have installed the same key in between
        if state.active == candidate {
            debug!(secret = %self.config.secret_id, "Signing key unchanged");
            return RotationOutcome::Unchanged;
        }

        let replaced = std::mem::replace(&mut state.active, candidate);
        let replaced_fingerprint = replaced.fingerprint();
        state.fallbacks.clear();
        if self.config.retain_fallback {
            state.fallbacks.push(replaced);
        } else {
            warn!(
                secret = %self.config.secret_id,
                "Fallback keys disabled, values signed with the replaced key will not verify"
            );
        }
        state.last_rotated_at = Some(Utc::now());

        info!(
            secret = %self.config.secret_id,
            old_fingerprint = %replaced_fingerprint,
            new_fingerprint = %state.active.fingerprint(),
            fallbacks = state.fallbacks.len(),
            "Rotated signing key"
        );
        self.metrics.record_key_rotated();
        RotationOutcome::Rotated
    }
}

/// Read the configured field of the JSON key secret.
async fn read_key(
    client: &dyn SecretsClient,
    config: &RotationConfig,
) -> secrets::Result<SecretString> {
    let payload = client.get_current_secret_string(&config.secret_id).await?;
    extract_field(&config.secret_id, payload.expose_secret(), &config.field_name)
}

fn extract_field(secret_id: &str, payload: &str, field: &str) -> secrets::Result<SecretString> {
    let fields: Map<String, Value> = serde_json::from_str(payload).map_err(|e| {
        RetrievalError::invalid_state(secret_id, format!("payload is not a JSON object: {}", e))
    })?;

    match fields.get(field) {
        Some(Value::String(key)) if !key.is_empty() => Ok(SecretString::new(key.as_str())),
        Some(Value::String(_)) => {
            Err(RetrievalError::invalid_state(secret_id, format!("field '{}' is empty", field)))
        }
        Some(_) => Err(RetrievalError::invalid_state(
            secret_id,
            format!("field '{}' is not a string", field),
        )),
        None => {
            Err(RetrievalError::invalid_state(secret_id, format!("field '{}' is missing", field)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{ErrorKind, InMemorySecretStore};
    use std::time::Duration;
    use tracing_test::traced_test;

    const SECRET: &str = "app/django";

    fn payload(key: &str) -> String {
        serde_json::json!({ "DJANGO_SECRET_KEY": key, "OTHER": "x" }).to_string()
    }

    fn controller(store: &Arc<InMemorySecretStore>, initial: &str) -> KeyRotationController {
        let config = RotationConfig::new(SECRET).with_refresh_interval(Duration::from_secs(60));
        KeyRotationController::new(store.clone(), config, SecretString::new(initial))
    }

    #[test]
    fn test_extract_field() {
        let key = extract_field(SECRET, &payload("k1"), "DJANGO_SECRET_KEY").unwrap();
        assert_eq!(key, "k1");

        let err = extract_field(SECRET, "not json", "DJANGO_SECRET_KEY").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = extract_field(SECRET, "[1, 2]", "DJANGO_SECRET_KEY").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = extract_field(SECRET, &payload("k1"), "MISSING").unwrap_err();
        assert!(err.detail().contains("missing"));

        let err = extract_field(SECRET, r#"{"DJANGO_SECRET_KEY": 42}"#, "DJANGO_SECRET_KEY")
            .unwrap_err();
        assert!(err.detail().contains("not a string"));
    }

    #[tokio::test]
    async fn test_unchanged_key_does_not_block_readers() {
        let store = Arc::new(InMemorySecretStore::new());
        let controller = controller(&store, "k0");

        // A held read guard would block a writer forever
        let reader = controller.state.read().unwrap();
        let outcome = std::thread::scope(|scope| {
            scope.spawn(|| controller.install(SecretString::new("k0"))).join().unwrap()
        });
        assert_eq!(outcome, RotationOutcome::Unchanged);
        assert_eq!(reader.active, "k0");
        drop(reader);

        assert_eq!(controller.install(SecretString::new("k1")), RotationOutcome::Rotated);
        assert_eq!(controller.current_keys().fallbacks, vec![SecretString::new("k0")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_waits_one_interval() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, payload("k1"));
        let controller = controller(&store, "k0");

        assert_eq!(controller.check_and_rotate().await, RotationOutcome::Skipped);
        assert_eq!(store.total_fetches(), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(controller.check_and_rotate().await, RotationOutcome::Rotated);
        assert_eq!(controller.current_keys().active, "k1");
        assert!(controller.last_rotated_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_now_ignores_interval() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, payload("k1"));
        let controller = controller(&store, "k0");

        assert_eq!(controller.rotate_now().await, RotationOutcome::Rotated);
        // interval restarted by the forced check
        assert_eq!(controller.check_and_rotate().await, RotationOutcome::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_fallback_retention() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, payload("k1"));
        let config = RotationConfig::new(SECRET).with_retain_fallback(false);
        let controller = KeyRotationController::new(store.clone(), config, "k0".into());

        assert_eq!(controller.rotate_now().await, RotationOutcome::Rotated);
        let keys = controller.current_keys();
        assert_eq!(keys.active, "k1");
        assert!(keys.fallbacks.is_empty());
    }

    #[tokio::test]
    async fn test_from_store_reads_initial_key() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, payload("k7"));

        let controller =
            KeyRotationController::from_store(store.clone(), RotationConfig::new(SECRET))
                .await
                .unwrap();
        assert_eq!(controller.current_keys().active, "k7");
        assert!(controller.last_rotated_at().is_none());

        let empty = Arc::new(InMemorySecretStore::new());
        let result = KeyRotationController::from_store(empty, RotationConfig::new(SECRET)).await;
        assert!(matches!(result, Err(crate::Error::Retrieval(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_checks_periodically() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, payload("k1"));
        let controller = Arc::new(controller(&store, "k0"));

        let handle = Arc::clone(&controller).spawn(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(controller.current_keys().active, "k1");
        handle.abort();
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn test_failures_are_logged_not_returned() {
        let store = Arc::new(InMemorySecretStore::new());
        store.put_string(SECRET, r#"{"WRONG_FIELD":"k1"}"#);
        let controller = controller(&store, "k0");

        assert_eq!(controller.rotate_now().await, RotationOutcome::Failed);
        assert!(logs_contain("Signing key check failed"));
        assert!(logs_contain("field 'DJANGO_SECRET_KEY' is missing"));

        store.put_string(SECRET, payload("k1"));
        assert_eq!(controller.rotate_now().await, RotationOutcome::Rotated);
        assert!(logs_contain("Rotated signing key"));
        assert!(!logs_contain("\"k1\""));
    }

    #[test]
    fn test_key_set_iterates_active_first() {
        let keys = KeySet { active: "k2".into(), fallbacks: vec!["k1".into()] };
        let order: Vec<&str> = keys.iter().map(|k| k.expose_secret()).collect();
        assert_eq!(order, vec!["k2", "k1"]);
    }
}
