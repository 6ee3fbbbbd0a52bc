//! Signing key rotation.
//!
//! [`KeyRotationController`] owns the active key and its single fallback.
//! Hosts trigger checks per unit of work (see [`middleware::rotate_signing_key`])
//! or on a timer ([`KeyRotationController::spawn`]); readers take snapshots via
//! [`KeyRotationController::current_keys`].

pub mod controller;
pub mod middleware;

pub use controller::{KeyRotationController, KeySet, RotationOutcome, MAX_FALLBACK_KEYS};
pub use middleware::rotate_signing_key;
