use asoc_registry::RegistryError;
use asoc_types::{AgentId, TypeError};
use thiserror::Error;

/// Errors from ticket construction and signing.
///
/// Validation never produces these; it returns a `ValidationResult`.
#[derive(Error, Debug)]
pub enum TicketError {
    #[error("invalid ticket contents: {0}")]
    InvalidPayload(#[from] TypeError),

    #[error("validity must be between 1 and {max} seconds, got {got}")]
    InvalidValidity { got: u64, max: u64 },

    #[error("signing failed: {0}")]
    Key(#[from] KeyError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("agent not found in registry: {0}")]
    AgentNotFound(AgentId),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Errors specific to key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("HMAC secret must be at least {min} bytes, got {got}")]
    SecretTooShort { min: usize, got: usize },

    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    #[error("key is verify-only and cannot sign")]
    VerifyOnly,
}

pub type TicketResult<T> = Result<T, TicketError>;
