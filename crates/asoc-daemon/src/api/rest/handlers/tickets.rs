//! Ticket issuance, validation and inspection handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use asoc_registry::get_agent_with_timeout;
use asoc_ticket::TicketRequest;
use asoc_types::{
    AgentId, AuditConstraints, AuditLevel, AuditTicketPayload, ErrorKind, Metadata,
    TransactionContext, ValidationResult,
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue ticket request.
///
/// With `constraints` the ticket is issued as requested. Without them the
/// agent's registry snapshot supplies level, constraints and kill switch.
#[derive(Debug, Deserialize)]
pub struct IssueTicketRequest {
    pub agent_id: AgentId,
    #[serde(default)]
    pub audit_level: Option<AuditLevel>,
    #[serde(default)]
    pub constraints: Option<AuditConstraints>,
    #[serde(default)]
    pub validity_seconds: Option<u64>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Issue ticket response
#[derive(Debug, Serialize)]
pub struct IssueTicketResponse {
    pub token: String,
    pub agent_id: AgentId,
    pub audit_level: AuditLevel,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Validity window in seconds
    pub expires_in: i64,
    pub algorithm: String,
}

/// Issue a new ticket
pub async fn issue_ticket(
    State(state): State<AppState>,
    Json(request): Json<IssueTicketRequest>,
) -> ApiResult<Json<IssueTicketResponse>> {
    let ticket_request = match request.constraints {
        Some(constraints) => {
            let level = request.audit_level.ok_or_else(|| {
                ApiError::BadRequest("audit_level is required with explicit constraints".into())
            })?;
            TicketRequest::new(request.agent_id.clone(), level, constraints)
        }
        None => {
            let snapshot =
                get_agent_with_timeout(state.registry.as_ref(), &request.agent_id, state.registry_timeout())
                    .await?
                    .ok_or_else(|| {
                        ApiError::NotFound(format!("Agent {} not found", request.agent_id))
                    })?;
            TicketRequest::from_snapshot(&snapshot)
        }
    };

    let mut ticket_request = ticket_request.with_metadata(request.metadata.unwrap_or_default());
    ticket_request.validity_seconds = request.validity_seconds;

    let token = state.issuer.issue(ticket_request)?;
    let payload = state
        .issuer
        .decode_unsafe(token.as_str())
        .ok_or_else(|| ApiError::Internal("freshly issued ticket did not decode".into()))?;

    Ok(Json(IssueTicketResponse {
        token: token.into_string(),
        agent_id: payload.subject().clone(),
        audit_level: payload.audit_level(),
        issued_at: payload.issued_at(),
        expires_at: payload.expires_at(),
        expires_in: payload.remaining_seconds(payload.issued_at()),
        algorithm: state.issuer.algorithm().to_string(),
    }))
}

/// Validate ticket request
#[derive(Debug, Deserialize)]
pub struct ValidateTicketRequest {
    pub token: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub target_server: Option<String>,
}

/// Validate ticket response
#[derive(Debug, Serialize)]
pub struct ValidateTicketResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<AuditTicketPayload>,
}

impl From<ValidationResult> for ValidateTicketResponse {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid(payload) => Self {
                valid: true,
                error_code: None,
                message: None,
                claims: Some(payload),
            },
            ValidationResult::Invalid { kind, message, .. } => {
                let message = if kind == ErrorKind::InternalError {
                    tracing::error!(reason = %message, "Ticket validation hit an internal error");
                    "Internal validation error".to_string()
                } else {
                    message
                };
                Self {
                    valid: false,
                    error_code: Some(kind),
                    message: Some(message),
                    claims: None,
                }
            }
        }
    }
}

/// Validate a ticket, optionally against a transaction
pub async fn validate_ticket(
    State(state): State<AppState>,
    Json(request): Json<ValidateTicketRequest>,
) -> Json<ValidateTicketResponse> {
    let tx = TransactionContext {
        value: request.value,
        target_server: request.target_server,
    };

    let result = if state.live_validation() {
        state
            .issuer
            .validate_transaction_live(
                &request.token,
                &tx,
                state.registry.as_ref(),
                state.registry_timeout(),
            )
            .await
    } else {
        state.issuer.validate_with_context(&request.token, &tx)
    };

    Json(result.into())
}

/// Inspect ticket request
#[derive(Debug, Deserialize)]
pub struct InspectTicketRequest {
    pub token: String,
}

/// Inspect ticket response
#[derive(Debug, Serialize)]
pub struct InspectTicketResponse {
    /// Always false: inspection never checks the signature.
    pub verified: bool,
    pub claims: AuditTicketPayload,
}

/// Decode a ticket without verifying it
pub async fn inspect_ticket(
    State(state): State<AppState>,
    Json(request): Json<InspectTicketRequest>,
) -> ApiResult<Json<InspectTicketResponse>> {
    let claims = state
        .issuer
        .decode_unsafe(&request.token)
        .ok_or_else(|| ApiError::BadRequest("Ticket could not be decoded".into()))?;

    Ok(Json(InspectTicketResponse {
        verified: false,
        claims,
    }))
}
