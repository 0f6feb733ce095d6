//! axum middleware adapter.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/transactions", post(handler))
//!     .route_layer(axum::middleware::from_fn_with_state(gate.clone(), asoc_gate::axum::enforce));
//! ```
//!
//! Admitted requests carry an [`AgentIdentity`] in their extensions when a
//! ticket was presented.

use ::axum::body::{to_bytes, Body};
use ::axum::extract::{Request, State};
use ::axum::http::StatusCode;
use ::axum::middleware::Next;
use ::axum::response::{IntoResponse, Response};
use ::axum::Json;
use serde_json::json;

use crate::gate::{AgentIdentity, EnforcementGate, GateOutcome};
use crate::request::GateRequest;
use crate::response::GateResponse;

impl IntoResponse for GateResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// Run the gate in front of the wrapped handler.
pub async fn enforce(State(gate): State<EnforcementGate>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, gate.config().body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Request body rejected before ticket validation");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "Payload Too Large",
                    "code": 413,
                    "message": "Request body exceeds the configured limit",
                })),
            )
                .into_response();
        }
    };

    let mut gate_request = GateRequest::new();
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            gate_request.insert_header(name.as_str(), value);
        }
    }
    if !bytes.is_empty() {
        match serde_json::from_slice(&bytes) {
            Ok(body) => gate_request.set_body(Some(body)),
            Err(e) => {
                tracing::debug!(error = %e, "Request body is not JSON");
                gate_request.mark_body_malformed();
            }
        }
    }

    match gate.admit(&gate_request).await {
        GateOutcome::Admitted(identity) => {
            let mut request = Request::from_parts(parts, Body::from(bytes));
            if let Some(identity) = identity {
                request.extensions_mut().insert::<AgentIdentity>(identity);
            }
            next.run(request).await
        }
        GateOutcome::Rejected(rejection) => gate.respond(&rejection).into_response(),
    }
}
