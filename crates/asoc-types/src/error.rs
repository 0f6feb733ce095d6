use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised when a value would violate a construction-time invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("max_op_value must be finite and greater than zero, got {0}")]
    InvalidOpValue(f64),

    #[error("expires_at ({expires_at}) must be after issued_at ({issued_at})")]
    InvalidValidityWindow {
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },

    #[error("ticket subject must not be empty")]
    EmptySubject,

    #[error("ticket issuer must not be empty")]
    EmptyIssuer,

    #[error("invalid agent snapshot: {0}")]
    InvalidSnapshot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TypeError::InvalidOpValue(-1.0);
        assert!(err.to_string().contains("-1"));
        assert!(TypeError::EmptySubject.to_string().contains("subject"));
    }
}
