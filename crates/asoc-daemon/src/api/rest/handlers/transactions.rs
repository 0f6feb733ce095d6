//! Ticket-protected transaction handler

use asoc_gate::AgentIdentity;
use asoc_types::{AgentId, AuditLevel};
use axum::{Extension, Json};
use serde::Serialize;

/// Transaction acceptance response
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_level: Option<AuditLevel>,
    pub transaction: serde_json::Value,
}

/// Accept a transaction that passed the enforcement gate.
///
/// The identity is absent only when the gate admits requests without proof.
pub async fn create_transaction(
    identity: Option<Extension<AgentIdentity>>,
    Json(transaction): Json<serde_json::Value>,
) -> Json<TransactionResponse> {
    let identity = identity.map(|Extension(identity)| identity);

    if let Some(identity) = &identity {
        tracing::info!(agent_id = %identity.agent_id, "Transaction accepted");
    }

    Json(TransactionResponse {
        status: "accepted".to_string(),
        agent_id: identity.as_ref().map(|i| i.agent_id.clone()),
        audit_level: identity.as_ref().map(|i| i.audit_level),
        transaction,
    })
}
