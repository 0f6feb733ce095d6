//! Registry error types

use asoc_types::{AgentId, TypeError};
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Agent already exists: {0}")]
    AgentAlreadyExists(AgentId),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] TypeError),

    #[error("Registry call timed out after {0} ms")]
    Timeout(u64),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
