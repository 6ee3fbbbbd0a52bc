//! HMAC-SHA256 value signing backed by the rotating key set.
//!
//! New values are signed with the active key. Verification tries the active key
//! and then each fallback, so a value signed just before a rotation still
//! verifies until the next rotation evicts that key.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::rotation::{KeyRotationController, KeySet};
use crate::secrets::SecretString;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = ':';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signed value has no signature")]
    Missing,

    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Signature does not match any current signing key")]
    Mismatch,

    #[error("Signing key rejected by HMAC")]
    InvalidKey,
}

/// Signs and verifies values with the keys held by a [`KeyRotationController`].
#[derive(Clone)]
pub struct Signer {
    controller: Arc<KeyRotationController>,
}

impl Signer {
    pub fn new(controller: Arc<KeyRotationController>) -> Self {
        Self { controller }
    }

    /// Returns `value:signature`, signed with the active key.
    pub fn sign(&self, value: &str) -> Result<String, SignatureError> {
        let keys = self.controller.current_keys();
        let signature = hex::encode(mac_for(&keys.active, value)?.finalize().into_bytes());
        Ok(format!("{}{}{}", value, SEPARATOR, signature))
    }

    /// Verify a `value:signature` string and return the value.
    pub fn unsign<'a>(&self, signed: &'a str) -> Result<&'a str, SignatureError> {
        verify_with(&self.controller.current_keys(), signed)
    }
}

fn mac_for(key: &SecretString, value: &str) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(key.expose_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(value.as_bytes());
    Ok(mac)
}

fn verify_with<'a>(keys: &KeySet, signed: &'a str) -> Result<&'a str, SignatureError> {
    let (value, signature) = signed.rsplit_once(SEPARATOR).ok_or(SignatureError::Missing)?;
    let signature = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    let verified = keys
        .iter()
        .filter_map(|key| mac_for(key, value).ok())
        .any(|mac| mac.verify_slice(&signature).is_ok());
    if verified {
        Ok(value)
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(active: &str, fallbacks: &[&str]) -> KeySet {
        KeySet {
            active: SecretString::new(active),
            fallbacks: fallbacks.iter().map(|k| SecretString::new(*k)).collect(),
        }
    }

    fn sign_with(key: &str, value: &str) -> String {
        let signature =
            hex::encode(mac_for(&SecretString::new(key), value).unwrap().finalize().into_bytes());
        format!("{}:{}", value, signature)
    }

    #[test]
    fn test_verifies_with_active_key() {
        let signed = sign_with("k1", "user:42");
        assert_eq!(verify_with(&keys("k1", &[]), &signed), Ok("user:42"));
    }

    #[test]
    fn test_verifies_with_fallback_key() {
        let signed = sign_with("k1", "session");
        assert_eq!(verify_with(&keys("k2", &["k1"]), &signed), Ok("session"));
    }

    #[test]
    fn test_evicted_key_no_longer_verifies() {
        let signed = sign_with("k1", "session");
        assert_eq!(verify_with(&keys("k3", &["k2"]), &signed), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_malformed_inputs() {
        let set = keys("k1", &[]);
        assert_eq!(verify_with(&set, "no-signature"), Err(SignatureError::Missing));
        assert_eq!(verify_with(&set, "value:zz"), Err(SignatureError::Malformed));
    }
}
