//! Default rejection responses.

use asoc_types::ErrorKind;
use serde_json::{json, Value};

use crate::config::GateConfig;
use crate::gate::Rejection;

/// Reason shown to clients for any internal fault.
const INTERNAL_REASON: &str = "Internal validation error";

/// Status code and JSON body for a rejected request.
#[derive(Clone, Debug, PartialEq)]
pub struct GateResponse {
    pub status: u16,
    pub body: Value,
}

/// 402 for a missing ticket, 500 for internal faults, 403 otherwise.
pub fn default_response(rejection: &Rejection, config: &GateConfig) -> GateResponse {
    match rejection {
        Rejection::ProofRequired => GateResponse {
            status: 402,
            body: json!({
                "error": "Payment Required",
                "code": 402,
                "message": format!("Audit ticket required in the {} header", config.header_name),
                "payment_context": {
                    "required_proof": config.header_name,
                    "issuer_endpoint": config.issuer_endpoint,
                    "documentation": config.documentation,
                },
            }),
        },
        Rejection::Forbidden {
            kind: ErrorKind::InternalError,
            ..
        } => GateResponse {
            status: 500,
            body: json!({
                "error": "Internal Server Error",
                "code": 500,
                "message": "Audit ticket could not be validated",
                "reason": INTERNAL_REASON,
                "error_code": ErrorKind::InternalError.code(),
            }),
        },
        Rejection::Forbidden { kind, message, .. } => GateResponse {
            status: 403,
            body: json!({
                "error": "Forbidden",
                "code": 403,
                "message": "Audit ticket rejected",
                "reason": message,
                "error_code": kind.code(),
            }),
        },
    }
}
