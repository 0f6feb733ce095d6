//! Gate configuration errors.

use thiserror::Error;

/// Errors raised while checking a [`GateConfig`](crate::GateConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("invalid proof header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("field path for {field} must not be empty")]
    EmptyFieldPath { field: &'static str },

    #[error("registry timeout must be greater than zero")]
    ZeroRegistryTimeout,

    #[error("live registry strictness requires an agent registry")]
    MissingRegistry,
}
