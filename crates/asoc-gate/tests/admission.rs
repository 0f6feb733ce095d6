//! Gate admission scenarios, including internal faults.

use std::sync::Arc;
use std::time::Duration;

use asoc_gate::{default_response, EnforcementGate, GateConfig, GateOutcome, GateRequest, Rejection, Strictness};
use asoc_registry::{AgentRegistry, RegistryError, StalledAgentRegistry, UnavailableAgentRegistry};
use asoc_ticket::{HmacKey, TicketIssuer, TicketRequest};
use asoc_types::{AgentId, AgentSnapshot, AuditConstraints, AuditLevel, ErrorKind};
use async_trait::async_trait;
use serde_json::json;

/// Registry whose reads panic.
struct PanickingRegistry;

#[async_trait]
impl AgentRegistry for PanickingRegistry {
    async fn get_agent(&self, _id: &AgentId) -> Result<Option<AgentSnapshot>, RegistryError> {
        panic!("registry driver crashed");
    }

    async fn set_kill_switch(&self, _id: &AgentId, _active: bool) -> Result<(), RegistryError> {
        Ok(())
    }
}

fn issuer() -> Arc<TicketIssuer> {
    let key = HmacKey::new(b"admission-secret-admission-secret".to_vec()).unwrap();
    Arc::new(TicketIssuer::new(Arc::new(key), "asoc-authority"))
}

fn gold_token(issuer: &TicketIssuer) -> String {
    issuer
        .issue(TicketRequest::new(
            "agent-12345",
            AuditLevel::Gold,
            AuditConstraints::new(50.0, ["finance-node", "trading-node"]).unwrap(),
        ))
        .unwrap()
        .into_string()
}

fn live_gate(issuer: Arc<TicketIssuer>, registry: Arc<dyn AgentRegistry>) -> EnforcementGate {
    let config = GateConfig {
        strictness: Strictness::LiveRegistry,
        registry_timeout_ms: 100,
        ..GateConfig::default()
    };
    EnforcementGate::builder(issuer, config)
        .registry(registry)
        .build()
        .unwrap()
}

fn expect_rejection(outcome: GateOutcome) -> Rejection {
    match outcome {
        GateOutcome::Rejected(rejection) => rejection,
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn no_header_with_enforcement_requires_credential() {
    let gate = EnforcementGate::new(issuer(), GateConfig::default()).unwrap();
    let request = GateRequest::new().with_body(json!({"amount": 25.0}));

    let rejection = expect_rejection(gate.admit(&request).await);
    assert_eq!(rejection, Rejection::ProofRequired);

    let response = gate.respond(&rejection);
    assert_eq!(response.status, 402);
    assert_eq!(response.body["payment_context"]["required_proof"], "X-ASOC-Proof");
    assert_eq!(response, default_response(&rejection, gate.config()));
}

#[tokio::test]
async fn custom_header_name() {
    let issuer = issuer();
    let config = GateConfig {
        header_name: "X-Audit-Ticket".into(),
        ..GateConfig::default()
    };
    let gate = EnforcementGate::new(issuer.clone(), config).unwrap();
    let token = gold_token(&issuer);

    let wrong = GateRequest::new().with_header("X-ASOC-Proof", token.clone());
    assert_eq!(
        expect_rejection(gate.admit(&wrong).await),
        Rejection::ProofRequired
    );

    let right = GateRequest::new().with_header("x-audit-ticket", token);
    assert!(gate.admit(&right).await.is_admitted());
}

#[tokio::test]
async fn panic_inside_validation_is_internal_error() {
    let issuer = issuer();
    let gate = live_gate(issuer.clone(), Arc::new(PanickingRegistry));
    let request = GateRequest::new().with_header("X-ASOC-Proof", gold_token(&issuer));

    let rejection = expect_rejection(gate.admit(&request).await);
    assert!(rejection.is_internal());

    let response = gate.respond(&rejection);
    assert_eq!(response.status, 500);
    assert!(!response.body.to_string().contains("driver crashed"));
}

#[tokio::test]
async fn registry_outage_is_internal_error() {
    let issuer = issuer();
    let gate = live_gate(issuer.clone(), Arc::new(UnavailableAgentRegistry::new("db down")));
    let request = GateRequest::new()
        .with_header("X-ASOC-Proof", gold_token(&issuer))
        .with_body(json!({"amount": 10}));

    let rejection = expect_rejection(gate.admit(&request).await);
    assert_eq!(rejection.kind(), Some(ErrorKind::InternalError));
}

#[tokio::test(start_paused = true)]
async fn slow_registry_times_out() {
    let issuer = issuer();
    let gate = live_gate(
        issuer.clone(),
        Arc::new(StalledAgentRegistry::new(Duration::from_secs(30))),
    );
    let request = GateRequest::new().with_header("X-ASOC-Proof", gold_token(&issuer));

    let rejection = expect_rejection(gate.admit(&request).await);
    assert!(rejection.is_internal());
}

#[tokio::test]
async fn gate_is_shareable_across_tasks() {
    let issuer = issuer();
    let gate = EnforcementGate::new(issuer.clone(), GateConfig::default()).unwrap();
    let token = gold_token(&issuer);

    let mut handles = Vec::new();
    for i in 0..16 {
        let gate = gate.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let amount = if i % 2 == 0 { 10.0 } else { 100.0 };
            let request = GateRequest::new()
                .with_header("X-ASOC-Proof", token)
                .with_body(json!({"amount": amount, "mcp_server": "trading-node"}));
            (i, gate.admit(&request).await.is_admitted())
        }));
    }

    for handle in handles {
        let (i, admitted) = handle.await.unwrap();
        assert_eq!(admitted, i % 2 == 0);
    }
}
