use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use asoc_registry::AgentRegistry;
use asoc_ticket::TicketIssuer;
use asoc_types::{
    AgentId, AuditLevel, AuditTicketPayload, ErrorKind, TransactionContext, ValidationResult,
};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{GateConfig, Strictness};
use crate::error::GateError;
use crate::path;
use crate::request::GateRequest;
use crate::response::{default_response, GateResponse};

/// Verified identity attached to an admitted request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentIdentity {
    pub agent_id: AgentId,
    pub audit_level: AuditLevel,
    pub payload: AuditTicketPayload,
}

impl AgentIdentity {
    fn from_payload(payload: AuditTicketPayload) -> Self {
        Self {
            agent_id: payload.subject().clone(),
            audit_level: payload.audit_level(),
            payload,
        }
    }
}

/// Why a request was turned away.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    /// No ticket on a route that requires one.
    ProofRequired,
    /// A ticket was presented and failed validation, or the gate faulted.
    ///
    /// `message` is server-side detail. For `InternalError` the default
    /// response replaces it with a generic reason.
    Forbidden {
        kind: ErrorKind,
        message: String,
        claims: Option<Box<AuditTicketPayload>>,
    },
}

impl Rejection {
    fn forbidden(kind: ErrorKind, message: impl Into<String>) -> Self {
        Rejection::Forbidden {
            kind,
            message: message.into(),
            claims: None,
        }
    }

    /// Validation failure kind; `None` for a missing ticket.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Rejection::ProofRequired => None,
            Rejection::Forbidden { kind, .. } => Some(*kind),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == Some(ErrorKind::InternalError)
    }
}

/// Result of [`EnforcementGate::admit`].
#[derive(Clone, Debug, PartialEq)]
pub enum GateOutcome {
    /// Let the request through. `None` when no ticket was presented and
    /// proof is optional.
    Admitted(Option<AgentIdentity>),
    Rejected(Rejection),
}

impl GateOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateOutcome::Admitted(_))
    }
}

/// Called once for every request admitted on a valid ticket.
pub type SuccessHook = Arc<dyn Fn(&AgentIdentity) + Send + Sync>;

/// Replaces the default rejection response.
pub type ErrorHandler = Arc<dyn Fn(&Rejection, &GateConfig) -> GateResponse + Send + Sync>;

/// Admission control for ticket-protected operations.
///
/// Cheap to clone; all state is behind `Arc`s and immutable after build.
#[derive(Clone)]
pub struct EnforcementGate {
    issuer: Arc<TicketIssuer>,
    config: Arc<GateConfig>,
    registry: Option<Arc<dyn AgentRegistry>>,
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHandler>,
}

/// Builder for [`EnforcementGate`].
pub struct EnforcementGateBuilder {
    issuer: Arc<TicketIssuer>,
    config: GateConfig,
    registry: Option<Arc<dyn AgentRegistry>>,
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHandler>,
}

impl EnforcementGateBuilder {
    pub fn registry(mut self, registry: Arc<dyn AgentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn on_success(mut self, hook: impl Fn(&AgentIdentity) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error(
        mut self,
        handler: impl Fn(&Rejection, &GateConfig) -> GateResponse + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<EnforcementGate, GateError> {
        self.config.validate()?;
        if self.config.strictness == Strictness::LiveRegistry && self.registry.is_none() {
            return Err(GateError::MissingRegistry);
        }
        Ok(EnforcementGate {
            issuer: self.issuer,
            config: Arc::new(self.config),
            registry: self.registry,
            on_success: self.on_success,
            on_error: self.on_error,
        })
    }
}

impl EnforcementGate {
    pub fn builder(issuer: Arc<TicketIssuer>, config: GateConfig) -> EnforcementGateBuilder {
        EnforcementGateBuilder {
            issuer,
            config,
            registry: None,
            on_success: None,
            on_error: None,
        }
    }

    /// Gate with no registry and no hooks.
    pub fn new(issuer: Arc<TicketIssuer>, config: GateConfig) -> Result<Self, GateError> {
        Self::builder(issuer, config).build()
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether `request` may proceed.
    ///
    /// Never panics and never returns an error: faults inside validation
    /// surface as `InternalError` rejections.
    pub async fn admit(&self, request: &GateRequest) -> GateOutcome {
        let outcome = match AssertUnwindSafe(self.evaluate(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Ticket validation panicked");
                GateOutcome::Rejected(Rejection::forbidden(
                    ErrorKind::InternalError,
                    "Ticket validation panicked",
                ))
            }
        };

        match &outcome {
            GateOutcome::Admitted(Some(identity)) => {
                info!(
                    agent_id = %identity.agent_id,
                    audit_level = %identity.audit_level,
                    "Request admitted"
                );
                if let Some(hook) = &self.on_success {
                    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| hook(identity))) {
                        error!(
                            agent_id = %identity.agent_id,
                            panic = %panic_message(panic.as_ref()),
                            "Success hook panicked"
                        );
                    }
                }
            }
            GateOutcome::Admitted(None) => debug!("Request admitted without proof"),
            GateOutcome::Rejected(Rejection::ProofRequired) => {
                debug!(header = %self.config.header_name, "Request rejected: proof required")
            }
            GateOutcome::Rejected(Rejection::Forbidden { kind, message, .. }) => {
                if kind.is_alertable() {
                    error!(kind = %kind, reason = %message, "Request rejected: internal error")
                } else if *kind == ErrorKind::KillSwitch {
                    warn!(reason = %message, "Request rejected: kill switch")
                } else {
                    debug!(kind = %kind, reason = %message, "Request rejected")
                }
            }
        }

        outcome
    }

    /// Response for a rejection: the custom handler if one was set,
    /// otherwise [`default_response`].
    pub fn respond(&self, rejection: &Rejection) -> GateResponse {
        match &self.on_error {
            Some(handler) => handler(rejection, &self.config),
            None => default_response(rejection, &self.config),
        }
    }

    async fn evaluate(&self, request: &GateRequest) -> GateOutcome {
        let token = request
            .header(&self.config.header_name)
            .map(str::trim)
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            return if self.config.require_proof {
                GateOutcome::Rejected(Rejection::ProofRequired)
            } else {
                GateOutcome::Admitted(None)
            };
        };

        if request.body_is_malformed() && !self.config.allow_non_json_body {
            return GateOutcome::Rejected(Rejection::forbidden(
                ErrorKind::ValidationFailed,
                "Request body is not valid JSON",
            ));
        }

        let tx = match self.transaction_context(request.body()) {
            Ok(tx) => tx,
            Err(message) => {
                return GateOutcome::Rejected(Rejection::forbidden(
                    ErrorKind::ValidationFailed,
                    message,
                ))
            }
        };

        let result = match self.config.strictness {
            Strictness::Embedded if tx.is_empty() => self.issuer.validate(token),
            Strictness::Embedded => self.issuer.validate_with_context(token, &tx),
            Strictness::LiveRegistry => match &self.registry {
                Some(registry) => {
                    let timeout = self.config.registry_timeout();
                    if tx.is_empty() {
                        self.issuer
                            .validate_live(token, registry.as_ref(), timeout)
                            .await
                    } else {
                        self.issuer
                            .validate_transaction_live(token, &tx, registry.as_ref(), timeout)
                            .await
                    }
                }
                None => ValidationResult::invalid(
                    ErrorKind::InternalError,
                    "Live validation configured without a registry",
                ),
            },
        };

        match result {
            ValidationResult::Valid(payload) => {
                GateOutcome::Admitted(Some(AgentIdentity::from_payload(payload)))
            }
            ValidationResult::Invalid {
                kind,
                message,
                claims,
            } => GateOutcome::Rejected(Rejection::Forbidden {
                kind,
                message,
                claims,
            }),
        }
    }

    fn transaction_context(&self, body: Option<&Value>) -> Result<TransactionContext, String> {
        let mut tx = TransactionContext::new();
        let Some(body) = body else {
            return Ok(tx);
        };

        match path::lookup(body, &self.config.value_field) {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => tx.value = n.as_f64(),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => tx.value = Some(v),
                _ => {
                    return Err(format!(
                        "Invalid transaction value at '{}'",
                        self.config.value_field
                    ))
                }
            },
            Some(_) => {
                return Err(format!(
                    "Invalid transaction value at '{}'",
                    self.config.value_field
                ))
            }
        }

        match path::lookup(body, &self.config.server_field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => tx.target_server = Some(s.clone()),
            Some(_) => {
                return Err(format!(
                    "Invalid target server at '{}'",
                    self.config.server_field
                ))
            }
        }

        Ok(tx)
    }
}

impl std::fmt::Debug for EnforcementGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcementGate")
            .field("issuer", &self.issuer)
            .field("config", &self.config)
            .field("has_registry", &self.registry.is_some())
            .field("has_success_hook", &self.on_success.is_some())
            .field("has_error_handler", &self.on_error.is_some())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asoc_registry::InMemoryAgentRegistry;
    use asoc_ticket::{HmacKey, TicketRequest};
    use asoc_types::{AgentSnapshot, AuditConstraints, BehavioralMetrics};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn issuer() -> Arc<TicketIssuer> {
        let key = HmacKey::new(b"gate-test-secret-gate-test-secret".to_vec()).unwrap();
        Arc::new(TicketIssuer::new(Arc::new(key), "asoc-authority"))
    }

    fn constraints() -> AuditConstraints {
        AuditConstraints::new(50.0, ["finance-node", "trading-node"]).unwrap()
    }

    fn token(issuer: &TicketIssuer, constraints: AuditConstraints) -> String {
        issuer
            .issue(TicketRequest::new("agent-12345", AuditLevel::Gold, constraints))
            .unwrap()
            .into_string()
    }

    fn request(token: &str, body: Value) -> GateRequest {
        GateRequest::new()
            .with_header("x-asoc-proof", token)
            .with_body(body)
    }

    #[tokio::test]
    async fn missing_proof_required() {
        let gate = EnforcementGate::new(issuer(), GateConfig::default()).unwrap();
        let outcome = gate.admit(&GateRequest::new()).await;
        assert_eq!(outcome, GateOutcome::Rejected(Rejection::ProofRequired));
    }

    #[tokio::test]
    async fn missing_proof_optional() {
        let config = GateConfig {
            require_proof: false,
            ..GateConfig::default()
        };
        let gate = EnforcementGate::new(issuer(), config).unwrap();
        assert_eq!(
            gate.admit(&GateRequest::new()).await,
            GateOutcome::Admitted(None)
        );
    }

    #[tokio::test]
    async fn blank_header_counts_as_missing() {
        let gate = EnforcementGate::new(issuer(), GateConfig::default()).unwrap();
        let outcome = gate
            .admit(&GateRequest::new().with_header("X-ASOC-Proof", "   "))
            .await;
        assert_eq!(outcome, GateOutcome::Rejected(Rejection::ProofRequired));
    }

    #[tokio::test]
    async fn valid_ticket_admits_with_identity() {
        let issuer = issuer();
        let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
        let token = token(&issuer, constraints());

        let outcome = gate
            .admit(&request(&token, json!({"amount": 25.0, "mcp_server": "finance-node"})))
            .await;
        match outcome {
            GateOutcome::Admitted(Some(identity)) => {
                assert_eq!(identity.agent_id.as_str(), "agent-12345");
                assert_eq!(identity.audit_level, AuditLevel::Gold);
            }
            other => panic!("expected admission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn numeric_string_value_is_checked() {
        let issuer = issuer();
        let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
        let token = token(&issuer, constraints());

        let outcome = gate.admit(&request(&token, json!({"amount": "75"}))).await;
        let GateOutcome::Rejected(rejection) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.kind(), Some(ErrorKind::ConstraintViolation));
    }

    #[tokio::test]
    async fn non_numeric_value_fails_validation() {
        let issuer = issuer();
        let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
        let token = token(&issuer, constraints());

        for body in [json!({"amount": "lots"}), json!({"amount": true}), json!({"amount": "NaN"})] {
            let GateOutcome::Rejected(rejection) = gate.admit(&request(&token, body)).await else {
                panic!("expected rejection");
            };
            assert_eq!(rejection.kind(), Some(ErrorKind::ValidationFailed));
        }
    }

    #[tokio::test]
    async fn server_only_body_is_checked() {
        let issuer = issuer();
        let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
        let token = token(&issuer, constraints());

        let GateOutcome::Rejected(rejection) = gate
            .admit(&request(&token, json!({"mcp_server": "legal-node"})))
            .await
        else {
            panic!("expected rejection");
        };
        assert_eq!(
            rejection,
            Rejection::Forbidden {
                kind: ErrorKind::ConstraintViolation,
                message: "legal-node not in allowed list".into(),
                claims: rejection_claims(&rejection),
            }
        );
    }

    fn rejection_claims(rejection: &Rejection) -> Option<Box<AuditTicketPayload>> {
        match rejection {
            Rejection::Forbidden { claims, .. } => claims.clone(),
            Rejection::ProofRequired => None,
        }
    }

    #[tokio::test]
    async fn nested_field_paths() {
        let issuer = issuer();
        let config = GateConfig {
            value_field: "payment.total".into(),
            server_field: "route.server".into(),
            ..GateConfig::default()
        };
        let gate = EnforcementGate::new(issuer.clone(), config).unwrap();
        let token = token(&issuer, constraints());

        let body = json!({"payment": {"total": 500}, "route": {"server": "finance-node"}});
        let outcome = gate.admit(&request(&token, body)).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn success_hook_fires_once_per_admission() {
        let issuer = issuer();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let gate = EnforcementGate::builder(issuer.clone(), GateConfig::default())
            .on_success(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        let token = token(&issuer, constraints());
        gate.admit(&request(&token, json!({"amount": 1}))).await;
        gate.admit(&request(&token, json!({"amount": 1000}))).await;
        gate.admit(&GateRequest::new()).await;
        gate.admit(&request(&token, json!({}))).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_success_hook_is_contained() {
        let issuer = issuer();
        let gate = EnforcementGate::builder(issuer.clone(), GateConfig::default())
            .on_success(|_| panic!("metrics sink down"))
            .build()
            .unwrap();

        let token = token(&issuer, constraints());
        let outcome = gate.admit(&request(&token, json!({"amount": 1}))).await;
        assert!(outcome.is_admitted());
    }

    fn malformed(token: Option<&str>) -> GateRequest {
        let mut request = GateRequest::new();
        if let Some(token) = token {
            request.insert_header("X-ASOC-Proof", token);
        }
        request.mark_body_malformed();
        request
    }

    #[tokio::test]
    async fn non_json_body_fails_closed() {
        let issuer = issuer();
        let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
        let token = token(&issuer, constraints());

        let GateOutcome::Rejected(rejection) = gate.admit(&malformed(Some(&token))).await else {
            panic!("expected rejection");
        };
        assert_eq!(
            rejection,
            Rejection::forbidden(ErrorKind::ValidationFailed, "Request body is not valid JSON")
        );

        // Without a ticket the credential requirement still comes first.
        assert_eq!(
            gate.admit(&malformed(None)).await,
            GateOutcome::Rejected(Rejection::ProofRequired)
        );
    }

    #[tokio::test]
    async fn non_json_body_admitted_when_allowed() {
        let issuer = issuer();
        let config = GateConfig {
            allow_non_json_body: true,
            ..GateConfig::default()
        };
        let gate = EnforcementGate::new(issuer.clone(), config).unwrap();
        let token = token(&issuer, constraints());

        assert!(gate.admit(&malformed(Some(&token))).await.is_admitted());
    }

    #[tokio::test]
    async fn custom_error_handler_controls_response() {
        let gate = EnforcementGate::builder(issuer(), GateConfig::default())
            .on_error(|rejection, _| GateResponse {
                status: 401,
                body: json!({"custom": rejection.kind().map(|k| k.code())}),
            })
            .build()
            .unwrap();

        let response = gate.respond(&Rejection::ProofRequired);
        assert_eq!(response.status, 401);
        assert_eq!(response.body, json!({"custom": null}));
    }

    #[tokio::test]
    async fn live_mode_requires_registry() {
        let config = GateConfig {
            strictness: Strictness::LiveRegistry,
            ..GateConfig::default()
        };
        let err = EnforcementGate::new(issuer(), config).unwrap_err();
        assert_eq!(err, GateError::MissingRegistry);
    }

    #[tokio::test]
    async fn live_mode_honours_registry_kill_switch() {
        let issuer = issuer();
        let registry = Arc::new(InMemoryAgentRegistry::new());
        registry
            .register(AgentSnapshot {
                agent_id: AgentId::new("agent-12345"),
                organization: "Acme".into(),
                audit_level: AuditLevel::Gold,
                trust_score: 90.0,
                verified_domain: None,
                certification: None,
                metrics: BehavioralMetrics::default(),
                kill_switch_active: false,
                constraints: constraints(),
            })
            .unwrap();

        let config = GateConfig {
            strictness: Strictness::LiveRegistry,
            ..GateConfig::default()
        };
        let gate = EnforcementGate::builder(issuer.clone(), config)
            .registry(registry.clone())
            .build()
            .unwrap();
        let token = token(&issuer, constraints());
        let req = request(&token, json!({"amount": 10}));

        assert!(gate.admit(&req).await.is_admitted());

        registry
            .set_kill_switch(&AgentId::new("agent-12345"), true)
            .await
            .unwrap();
        let GateOutcome::Rejected(rejection) = gate.admit(&req).await else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.kind(), Some(ErrorKind::KillSwitch));
    }

    #[test]
    fn panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
