//! Error types for secret retrieval.
//!
//! Every store client, caching or not, reports failures as a [`RetrievalError`]
//! carrying one of four [`ErrorKind`]s. The cache propagates these unchanged, so
//! a caller sees the same error whether or not a cache sits in front of the store.

use std::fmt;

use thiserror::Error;

/// Result type for secret retrieval.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Classification of a retrieval failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The secret, or the requested version stage of it, does not exist.
    NotFound,
    /// The caller is not permitted to read the secret, or its credentials are unusable.
    AccessDenied,
    /// The secret exists but cannot be returned as a string (binary-only value,
    /// malformed request, malformed payload).
    InvalidState,
    /// Network or service failure talking to the store.
    Transport,
}

impl ErrorKind {
    /// Stable lowercase label, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::InvalidState => "invalid_state",
            Self::Transport => "transport",
        }
    }

    /// Classify a Secrets Manager error code.
    ///
    /// Unknown codes, and failures that never produced a code, are `Transport`.
    pub fn from_store_code(code: Option<&str>) -> Self {
        match code {
            Some("ResourceNotFoundException") => Self::NotFound,
            Some(
                "AccessDeniedException"
                | "UnrecognizedClientException"
                | "ExpiredTokenException"
                | "InvalidSignatureException"
                | "DecryptionFailure",
            ) => Self::AccessDenied,
            Some("InvalidRequestException" | "InvalidParameterException") => Self::InvalidState,
            _ => Self::Transport,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "Secret not found",
            Self::AccessDenied => "Access denied",
            Self::InvalidState => "Invalid secret state",
            Self::Transport => "Store transport failure",
        };
        f.write_str(label)
    }
}

/// A failed attempt to read a secret from the store.
///
/// `Clone` so that a single failed refresh can be reported to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} for '{name}': {detail}")]
pub struct RetrievalError {
    kind: ErrorKind,
    name: String,
    detail: String,
}

impl RetrievalError {
    /// Create an error of an arbitrary kind.
    pub fn new(kind: ErrorKind, name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { kind, name: name.into(), detail: detail.into() }
    }

    /// Create a not found error.
    pub fn not_found(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, name, detail)
    }

    /// Create an access denied error.
    pub fn access_denied(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, name, detail)
    }

    /// Create an invalid state error.
    pub fn invalid_state(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, name, detail)
    }

    /// Create a transport error.
    pub fn transport(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, name, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The secret name or ARN the failed request was for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}
