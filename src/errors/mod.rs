//! # Error Handling
//!
//! Crate-level error type. Store failures stay as
//! [`RetrievalError`](crate::secrets::RetrievalError) inside the secrets layer
//! and convert into [`Error::Retrieval`] at the application boundary.
//! Configuration problems are a separate variant so startup can fail fast on
//! them.

use std::borrow::Cow;

use crate::secrets::RetrievalError;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Custom result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration, unusable store credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reading a secret from the store
    #[error("Secret retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Database connection parameters could not be produced
    #[error("Database credentials error: {0}")]
    Database(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new database credentials error
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(format!("Configuration loading failed: {}", error))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        flatten_validation_errors(&errors, "", &mut messages);
        messages.sort();
        Self::Config(messages.join("; "))
    }
}

fn flatten_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<Cow<'static, str>> = field_errors
                    .iter()
                    .map(|e| e.message.clone().unwrap_or(Cow::Borrowed("Invalid value")))
                    .collect();
                out.push(format!("{}: {}", path, messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => flatten_validation_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 1, message = "secret_id cannot be empty"))]
        secret_id: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(nested)]
        rotation: Inner,
    }

    #[test]
    fn test_error_constructors() {
        assert!(Error::config("missing secret_id").is_config());
        assert!(matches!(Error::database("bad port"), Error::Database(_)));
        assert!(matches!(Error::internal("oops"), Error::Internal(_)));
    }

    #[test]
    fn test_retrieval_error_converts() {
        let err: Error = RetrievalError::not_found("db", "no such secret").into();
        assert!(matches!(err, Error::Retrieval(_)));
        assert!(err.to_string().contains("Secret retrieval failed"));
    }

    #[test]
    fn test_nested_validation_errors_flatten_to_config() {
        let outer = Outer { rotation: Inner { secret_id: String::new() } };
        let err: Error = outer.validate().unwrap_err().into();

        assert!(err.is_config());
        assert!(err.to_string().contains("rotation.secret_id: secret_id cannot be empty"));
    }
}
