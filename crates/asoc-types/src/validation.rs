use serde::{Deserialize, Serialize};

use crate::ticket::AuditTicketPayload;

/// Failure taxonomy shared by the codec, the issuer and the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Expired,
    InvalidSignature,
    InvalidFormat,
    KillSwitch,
    ConstraintViolation,
    /// Failed validation without a more specific code.
    ValidationFailed,
    /// Unexpected fault in the core or one of its collaborators.
    InternalError,
}

impl ErrorKind {
    /// Machine-readable code used in rejection bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Expired => "EXPIRED",
            ErrorKind::InvalidSignature => "INVALID_SIGNATURE",
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::KillSwitch => "KILL_SWITCH",
            ErrorKind::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Only internal faults warrant alerting; everything else is a routine
    /// outcome of untrusted input.
    pub fn is_alertable(&self) -> bool {
        matches!(self, ErrorKind::InternalError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of validating a ticket.
///
/// `Invalid::claims` is only populated after the signature verified
/// (kill switch and constraint failures), so callers can attribute the
/// rejection to an agent. It never makes the outcome admissible.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationResult {
    Valid(AuditTicketPayload),
    Invalid {
        kind: ErrorKind,
        message: String,
        claims: Option<Box<AuditTicketPayload>>,
    },
}

impl ValidationResult {
    pub fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        ValidationResult::Invalid {
            kind,
            message: message.into(),
            claims: None,
        }
    }

    /// An invalid outcome that still carries the verified claim set.
    pub fn invalid_with_claims(
        kind: ErrorKind,
        message: impl Into<String>,
        claims: AuditTicketPayload,
    ) -> Self {
        ValidationResult::Invalid {
            kind,
            message: message.into(),
            claims: Some(Box::new(claims)),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid { message, .. } => Some(message),
        }
    }

    /// The admissible payload; `None` for every invalid outcome.
    pub fn payload(&self) -> Option<&AuditTicketPayload> {
        match self {
            ValidationResult::Valid(payload) => Some(payload),
            ValidationResult::Invalid { .. } => None,
        }
    }

    /// Decoded claims for attribution, whether or not the ticket was admitted.
    pub fn claims(&self) -> Option<&AuditTicketPayload> {
        match self {
            ValidationResult::Valid(payload) => Some(payload),
            ValidationResult::Invalid { claims, .. } => claims.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_form() {
        for kind in [
            ErrorKind::Expired,
            ErrorKind::InvalidSignature,
            ErrorKind::InvalidFormat,
            ErrorKind::KillSwitch,
            ErrorKind::ConstraintViolation,
            ErrorKind::ValidationFailed,
            ErrorKind::InternalError,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.code()));
        }
    }

    #[test]
    fn only_internal_errors_alert() {
        assert!(ErrorKind::InternalError.is_alertable());
        assert!(!ErrorKind::InvalidSignature.is_alertable());
        assert!(!ErrorKind::KillSwitch.is_alertable());
    }

    #[test]
    fn invalid_has_no_payload() {
        let result = ValidationResult::invalid(ErrorKind::Expired, "Ticket expired");
        assert!(!result.is_valid());
        assert_eq!(result.kind(), Some(ErrorKind::Expired));
        assert_eq!(result.message(), Some("Ticket expired"));
        assert!(result.payload().is_none());
        assert!(result.claims().is_none());
    }
}
