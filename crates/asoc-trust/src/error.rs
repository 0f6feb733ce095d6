//! Error types for asoc-trust.

use asoc_registry::RegistryError;
use thiserror::Error;

/// Errors from registry-backed trust computation.
#[derive(Debug, Error)]
pub enum TrustError {
    /// Registry read failed or timed out.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for trust operations.
pub type TrustResult<T> = Result<T, TrustError>;
