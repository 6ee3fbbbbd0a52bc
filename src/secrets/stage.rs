//! Version stages of a secret.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label attached to one version of a secret in the store.
///
/// `Current` and `Previous` are cached together by
/// [`CachedSecretsClient`](super::CachedSecretsClient); `Pending` is always
/// fetched from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionStage {
    #[default]
    #[serde(rename = "AWSCURRENT", alias = "current")]
    Current,
    #[serde(rename = "AWSPREVIOUS", alias = "previous")]
    Previous,
    #[serde(rename = "AWSPENDING", alias = "pending")]
    Pending,
}

impl VersionStage {
    /// Stages kept in the cache and refreshed together.
    pub const CACHED: [VersionStage; 2] = [VersionStage::Current, VersionStage::Previous];

    /// Wire label used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "AWSCURRENT",
            Self::Previous => "AWSPREVIOUS",
            Self::Pending => "AWSPENDING",
        }
    }

    pub fn is_cached(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for VersionStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AWSCURRENT" | "CURRENT" => Ok(Self::Current),
            "AWSPREVIOUS" | "PREVIOUS" => Ok(Self::Previous),
            "AWSPENDING" | "PENDING" => Ok(Self::Pending),
            _ => Err(format!("Unknown version stage: {}", s)),
        }
    }
}

impl fmt::Display for VersionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
