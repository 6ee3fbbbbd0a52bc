//! Database credentials sourced from the secrets cache.

pub mod credentials;

pub use credentials::{ConnectionParams, DatabaseCredentials, DatabaseEngine};
