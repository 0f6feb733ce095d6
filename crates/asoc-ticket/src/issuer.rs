use std::sync::Arc;
use std::time::Duration;

use asoc_registry::{get_agent_with_timeout, AgentRegistry};
use asoc_types::{
    AgentId, AgentSnapshot, AuditConstraints, AuditLevel, AuditTicketPayload, ErrorKind,
    Metadata, SignedTicket, TransactionContext, ValidationResult,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::constraint::ConstraintEvaluator;
use crate::error::{TicketError, TicketResult};
use crate::key::{Algorithm, TicketKey};

/// Validity applied when a request does not specify one (5 minutes).
pub const DEFAULT_VALIDITY_SECS: u64 = 300;

/// Upper bound on a single ticket's validity (one year).
pub const MAX_VALIDITY_SECS: u64 = 365 * 24 * 60 * 60;

/// Everything the issuer needs to mint one ticket.
#[derive(Clone, Debug)]
pub struct TicketRequest {
    pub agent_id: AgentId,
    pub audit_level: AuditLevel,
    pub constraints: AuditConstraints,
    pub validity_seconds: Option<u64>,
    pub metadata: Metadata,
}

impl TicketRequest {
    pub fn new(
        agent_id: impl Into<AgentId>,
        audit_level: AuditLevel,
        constraints: AuditConstraints,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            audit_level,
            constraints,
            validity_seconds: None,
            metadata: Metadata::new(),
        }
    }

    /// Request built from a freshly read registry snapshot. The live kill
    /// switch is folded into the embedded constraints.
    pub fn from_snapshot(snapshot: &AgentSnapshot) -> Self {
        Self::new(
            snapshot.agent_id.clone(),
            snapshot.audit_level,
            snapshot.effective_constraints(),
        )
        .metadata("organization", serde_json::json!(snapshot.organization))
    }

    pub fn validity_seconds(mut self, secs: u64) -> Self {
        self.validity_seconds = Some(secs);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }
}

/// Issues and validates audit tickets.
///
/// Holds only immutable configuration (key, issuer name, default validity),
/// so a single instance can be cloned or shared behind an `Arc` across any
/// number of threads and tasks. The synchronous methods never block on I/O;
/// the `*_live` and `issue_for_agent` methods are the async paths that
/// consult a registry.
#[derive(Clone)]
pub struct TicketIssuer {
    key: Arc<dyn TicketKey>,
    issuer: String,
    default_validity_secs: u64,
}

impl TicketIssuer {
    pub fn new(key: Arc<dyn TicketKey>, issuer: impl Into<String>) -> Self {
        Self {
            key,
            issuer: issuer.into(),
            default_validity_secs: DEFAULT_VALIDITY_SECS,
        }
    }

    pub fn with_default_validity(mut self, secs: u64) -> Self {
        self.default_validity_secs = secs;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    pub fn default_validity_secs(&self) -> u64 {
        self.default_validity_secs
    }

    /// Mint a ticket valid from now.
    pub fn issue(&self, request: TicketRequest) -> TicketResult<SignedTicket> {
        self.issue_at(request, Utc::now())
    }

    /// Mint a ticket valid from `now`.
    pub fn issue_at(&self, request: TicketRequest, now: DateTime<Utc>) -> TicketResult<SignedTicket> {
        let validity = request.validity_seconds.unwrap_or(self.default_validity_secs);
        if validity == 0 || validity > MAX_VALIDITY_SECS {
            return Err(TicketError::InvalidValidity {
                got: validity,
                max: MAX_VALIDITY_SECS,
            });
        }

        let expires_at = now + chrono::Duration::seconds(validity as i64);
        let payload = AuditTicketPayload::new(
            self.issuer.clone(),
            request.agent_id,
            now,
            expires_at,
            request.audit_level,
            request.constraints,
            request.metadata,
        )?;

        let token = codec::sign(&payload, self.key.as_ref())?;

        info!(
            agent_id = %payload.subject(),
            audit_level = %payload.audit_level(),
            max_op_value = payload.constraints().max_op_value(),
            kill_switch = payload.constraints().kill_switch_active(),
            expires_at = %payload.expires_at(),
            "Audit ticket issued"
        );

        Ok(token)
    }

    /// Read the agent from the registry and mint a ticket from that snapshot.
    pub async fn issue_for_agent(
        &self,
        registry: &dyn AgentRegistry,
        agent_id: &AgentId,
        validity_seconds: Option<u64>,
        timeout: Duration,
    ) -> TicketResult<SignedTicket> {
        let snapshot = get_agent_with_timeout(registry, agent_id, timeout)
            .await?
            .ok_or_else(|| TicketError::AgentNotFound(agent_id.clone()))?;

        let mut request = TicketRequest::from_snapshot(&snapshot);
        request.validity_seconds = validity_seconds;
        self.issue(request)
    }

    /// Signature, issuer, expiry and embedded kill switch.
    pub fn validate(&self, token: &str) -> ValidationResult {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> ValidationResult {
        match codec::verify_at(token, self.key.as_ref(), &self.issuer, now) {
            ValidationResult::Valid(payload) if payload.constraints().kill_switch_active() => {
                warn!(agent_id = %payload.subject(), "Ticket rejected: kill switch active");
                ValidationResult::invalid_with_claims(
                    ErrorKind::KillSwitch,
                    "Agent kill switch activated",
                    payload,
                )
            }
            result => result,
        }
    }

    /// [`validate`](Self::validate) plus the transaction constraint rules.
    pub fn validate_transaction(
        &self,
        token: &str,
        value: f64,
        target_server: Option<&str>,
    ) -> ValidationResult {
        let mut tx = TransactionContext::new().with_value(value);
        tx.target_server = target_server.map(str::to_string);
        self.validate_with_context(token, &tx)
    }

    /// Transaction validation with an arbitrary (possibly partial) context.
    pub fn validate_with_context(&self, token: &str, tx: &TransactionContext) -> ValidationResult {
        self.validate_with_context_at(token, tx, Utc::now())
    }

    pub fn validate_with_context_at(
        &self,
        token: &str,
        tx: &TransactionContext,
        now: DateTime<Utc>,
    ) -> ValidationResult {
        apply_constraints(self.validate_at(token, now), tx)
    }

    /// [`validate`](Self::validate), then re-check the agent against the
    /// live registry so a kill switch flipped after issuance takes effect
    /// before natural expiry.
    pub async fn validate_live(
        &self,
        token: &str,
        registry: &dyn AgentRegistry,
        timeout: Duration,
    ) -> ValidationResult {
        apply_live_state(self.validate(token), registry, timeout).await
    }

    pub async fn validate_transaction_live(
        &self,
        token: &str,
        tx: &TransactionContext,
        registry: &dyn AgentRegistry,
        timeout: Duration,
    ) -> ValidationResult {
        let result = apply_live_state(self.validate(token), registry, timeout).await;
        apply_constraints(result, tx)
    }

    /// Inspection helper; see [`codec::decode_unsafe`].
    pub fn decode_unsafe(&self, token: &str) -> Option<AuditTicketPayload> {
        codec::decode_unsafe(token)
    }
}

impl std::fmt::Debug for TicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketIssuer")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.key.algorithm())
            .field("default_validity_secs", &self.default_validity_secs)
            .finish()
    }
}

fn apply_constraints(result: ValidationResult, tx: &TransactionContext) -> ValidationResult {
    let ValidationResult::Valid(payload) = result else {
        return result;
    };

    match ConstraintEvaluator::check(payload.constraints(), tx) {
        Ok(()) => ValidationResult::Valid(payload),
        Err(violation) => {
            debug!(
                agent_id = %payload.subject(),
                rule = ?violation.rule,
                reason = %violation.message,
                "Transaction rejected by ticket constraints"
            );
            ValidationResult::invalid_with_claims(
                ErrorKind::ConstraintViolation,
                violation.message,
                payload,
            )
        }
    }
}

async fn apply_live_state(
    result: ValidationResult,
    registry: &dyn AgentRegistry,
    timeout: Duration,
) -> ValidationResult {
    let ValidationResult::Valid(payload) = result else {
        return result;
    };

    match get_agent_with_timeout(registry, payload.subject(), timeout).await {
        Ok(Some(agent)) if agent.kill_switch_active => {
            warn!(agent_id = %payload.subject(), "Ticket rejected: live kill switch active");
            ValidationResult::invalid_with_claims(
                ErrorKind::KillSwitch,
                "Agent kill switch activated",
                payload,
            )
        }
        Ok(Some(_)) => ValidationResult::Valid(payload),
        Ok(None) => {
            debug!(agent_id = %payload.subject(), "Ticket rejected: agent unknown to registry");
            ValidationResult::invalid_with_claims(ErrorKind::ValidationFailed, "Unknown agent", payload)
        }
        Err(e) => {
            error!(agent_id = %payload.subject(), error = %e, "Live registry check failed");
            ValidationResult::invalid_with_claims(
                ErrorKind::InternalError,
                "Registry unavailable",
                payload,
            )
        }
    }
}
