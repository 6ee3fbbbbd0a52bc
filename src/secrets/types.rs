//! Redacting wrapper for secret values.
//!
//! Everything the cache hands out is a [`SecretString`], so secret values never
//! reach logs, `Debug` output or serialized structs by accident.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string whose contents are redacted in `Debug`, `Display` and serialization,
/// and zeroed when dropped.
///
/// Deserialization accepts the real value, so configuration files can carry
/// credentials. Reading the value requires an explicit call to
/// [`expose_secret`](SecretString::expose_secret).
///
/// ```rust,ignore
/// use secrets_cache::secrets::SecretString;
///
/// let key = SecretString::new("k-123");
/// assert_eq!(format!("{:?}", key), "SecretString([REDACTED])");
/// assert_eq!(key.expose_secret(), "k-123");
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Raw bytes, for key material handed to MAC or cipher constructors.
    pub fn expose_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short, non-reversible identifier of the value: the first 8 hex characters
    /// of its SHA-256 digest.
    ///
    /// Lets operators tell two keys apart in logs without seeing either.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl PartialEq<str> for SecretString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SecretString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redacts_debug_and_display() {
        let secret = SecretString::new("super-secret-value");

        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_string_serialization_redacts() {
        #[derive(Serialize)]
        struct Params {
            user: String,
            password: SecretString,
        }

        let params =
            Params { user: "app".to_string(), password: SecretString::new("hidden-password") };
        let json = serde_json::to_string(&params).unwrap();

        assert!(json.contains("app"));
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("hidden-password"));
    }

    #[test]
    fn test_secret_string_deserialization_accepts_values() {
        let secret: SecretString = serde_json::from_str("\"my-actual-secret\"").unwrap();
        assert_eq!(secret.expose_secret(), "my-actual-secret");
    }

    #[test]
    fn test_secret_string_compares_with_str() {
        let secret = SecretString::new("v2");
        assert_eq!(secret, "v2");
        assert_ne!(secret, SecretString::new("v1"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let a = SecretString::new("key-one");
        let b = SecretString::new("key-two");

        assert_eq!(a.fingerprint(), SecretString::new("key-one").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 8);
        assert!(!a.fingerprint().contains("key-one"));
    }

    #[test]
    fn test_secret_string_length() {
        assert_eq!(SecretString::new("12345").len(), 5);
        assert!(SecretString::default().is_empty());
    }
}
