//! Error types for asoc-daemon

use asoc_gate::GateError;
use asoc_registry::RegistryError;
use asoc_ticket::{KeyError, TicketError};
use asoc_trust::TrustError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing key could not be built
    #[error("Signing key error: {0}")]
    Key(#[from] KeyError),

    /// Gate configuration rejected
    #[error("Gate configuration error: {0}")]
    Gate(#[from] GateError),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error; detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AgentNotFound(id) => ApiError::NotFound(format!("Agent {} not found", id)),
            RegistryError::AgentAlreadyExists(id) => {
                ApiError::Conflict(format!("Agent {} already exists", id))
            }
            RegistryError::InvalidSnapshot(e) => ApiError::Validation(e.to_string()),
            e @ (RegistryError::Timeout(_) | RegistryError::Unavailable(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::InvalidPayload(e) => ApiError::Validation(e.to_string()),
            e @ TicketError::InvalidValidity { .. } => ApiError::Validation(e.to_string()),
            TicketError::AgentNotFound(id) => ApiError::NotFound(format!("Agent {} not found", id)),
            TicketError::Registry(e) => e.into(),
            e @ (TicketError::Key(_) | TicketError::Serialization(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TrustError> for ApiError {
    fn from(err: TrustError) -> Self {
        match err {
            TrustError::Registry(e) => e.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let error = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Request failed with internal error");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: code.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
