use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::constraints::AuditConstraints;
use crate::error::TypeError;
use crate::ids::AgentId;
use crate::level::AuditLevel;

/// Opaque key/value metadata carried in a ticket. Ordered so the encoding
/// is deterministic.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// The signed claim set of an audit ticket.
///
/// Created once by the issuer and never mutated after signing. Timestamps
/// are truncated to whole seconds because the wire form carries integer
/// Unix seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PayloadWire")]
pub struct AuditTicketPayload {
    iss: String,
    sub: AgentId,
    #[serde(with = "chrono::serde::ts_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    exp: DateTime<Utc>,
    audit_level: AuditLevel,
    constraints: AuditConstraints,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: Metadata,
}

#[derive(Deserialize)]
struct PayloadWire {
    iss: String,
    sub: AgentId,
    #[serde(with = "chrono::serde::ts_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    exp: DateTime<Utc>,
    audit_level: AuditLevel,
    constraints: AuditConstraints,
    #[serde(default)]
    metadata: Option<Metadata>,
}

impl TryFrom<PayloadWire> for AuditTicketPayload {
    type Error = TypeError;

    fn try_from(wire: PayloadWire) -> Result<Self, Self::Error> {
        AuditTicketPayload::new(
            wire.iss,
            wire.sub,
            wire.iat,
            wire.exp,
            wire.audit_level,
            wire.constraints,
            wire.metadata.unwrap_or_default(),
        )
    }
}

impl AuditTicketPayload {
    /// Build a payload, enforcing `expires_at > issued_at` after truncating
    /// both to whole seconds.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<AgentId>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        audit_level: AuditLevel,
        constraints: AuditConstraints,
        metadata: Metadata,
    ) -> Result<Self, TypeError> {
        let iss = issuer.into();
        if iss.trim().is_empty() {
            return Err(TypeError::EmptyIssuer);
        }

        let sub = subject.into();
        if sub.is_empty() {
            return Err(TypeError::EmptySubject);
        }

        let iat = issued_at.trunc_subsecs(0);
        let exp = expires_at.trunc_subsecs(0);
        if exp <= iat {
            return Err(TypeError::InvalidValidityWindow {
                issued_at: iat,
                expires_at: exp,
            });
        }

        Ok(Self {
            iss,
            sub,
            iat,
            exp,
            audit_level,
            constraints,
            metadata,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// The agent this ticket was issued to.
    pub fn subject(&self) -> &AgentId {
        &self.sub
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.iat
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }

    pub fn audit_level(&self) -> AuditLevel {
        self.audit_level
    }

    pub fn constraints(&self) -> &AuditConstraints {
        &self.constraints
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// A ticket is expired from the instant `exp` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.exp
    }

    /// Seconds of validity left at `now`, zero once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now).num_seconds().max(0)
    }
}

/// A signed, transmissible ticket: `header.payload.signature`, each segment
/// base64url-encoded without padding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedTicket(String);

impl SignedTicket {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SignedTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SignedTicket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn constraints() -> AuditConstraints {
        AuditConstraints::new(50.0, ["finance-node"]).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        let err = AuditTicketPayload::new(
            "asoc",
            "agent-1",
            at(1_000),
            at(1_000),
            AuditLevel::Gold,
            constraints(),
            Metadata::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TypeError::InvalidValidityWindow { .. }));
    }

    #[test]
    fn rejects_sub_second_window() {
        let iat = at(1_000) + Duration::milliseconds(100);
        let exp = at(1_000) + Duration::milliseconds(900);
        assert!(AuditTicketPayload::new(
            "asoc",
            "agent-1",
            iat,
            exp,
            AuditLevel::Gold,
            constraints(),
            Metadata::new(),
        )
        .is_err());
    }

    #[test]
    fn rejects_empty_subject_and_issuer() {
        let make = |iss: &str, sub: &str| {
            AuditTicketPayload::new(
                iss,
                sub,
                at(0),
                at(10),
                AuditLevel::Bronze,
                constraints(),
                Metadata::new(),
            )
        };
        assert_eq!(make("asoc", "").unwrap_err(), TypeError::EmptySubject);
        assert_eq!(make("", "agent").unwrap_err(), TypeError::EmptyIssuer);
    }

    #[test]
    fn wire_shape_uses_integer_seconds() {
        let payload = AuditTicketPayload::new(
            "asoc-authority",
            "agent-12345",
            at(1_700_000_000),
            at(1_700_000_300),
            AuditLevel::Gold,
            constraints(),
            Metadata::new(),
        )
        .unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["iss"], "asoc-authority");
        assert_eq!(json["sub"], "agent-12345");
        assert_eq!(json["iat"], 1_700_000_000i64);
        assert_eq!(json["exp"], 1_700_000_300i64);
        assert_eq!(json["audit_level"], "gold");
        assert!(json.get("metadata").is_none());

        let back: AuditTicketPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn decode_rejects_expired_before_issued() {
        let json = serde_json::json!({
            "iss": "asoc",
            "sub": "agent",
            "iat": 200,
            "exp": 100,
            "audit_level": "silver",
            "constraints": {
                "max_op_value": 1.0,
                "allowed_mcp_servers": [],
                "kill_switch_active": false
            }
        });
        assert!(serde_json::from_value::<AuditTicketPayload>(json).is_err());
    }

    #[test]
    fn expiry_is_inclusive_of_exp() {
        let payload = AuditTicketPayload::new(
            "asoc",
            "agent",
            at(100),
            at(400),
            AuditLevel::Silver,
            constraints(),
            Metadata::new(),
        )
        .unwrap();
        assert!(!payload.is_expired_at(at(399)));
        assert!(payload.is_expired_at(at(400)));
        assert_eq!(payload.remaining_seconds(at(100)), 300);
        assert_eq!(payload.remaining_seconds(at(500)), 0);
    }
}
