//! ASOC Gate - admission control at the boundary of a transaction call
//!
//! The gate reads an audit ticket from a request header, pulls the declared
//! transaction value and target server out of the JSON body, and decides
//! whether the request may proceed.
//!
//! ## Outcomes
//!
//! | Situation | Outcome | Default status |
//! |-----------|---------|----------------|
//! | no ticket, proof required | `Rejected(ProofRequired)` | 402 |
//! | no ticket, proof optional | `Admitted(None)` | - |
//! | ticket valid for the transaction | `Admitted(Some(identity))` | - |
//! | ticket invalid | `Rejected(Forbidden)` | 403 |
//! | internal fault (panic, registry down) | `Rejected(Forbidden)` with `InternalError` | 500 |
//!
//! The gate is transport-neutral: it works on [`GateRequest`]. With the
//! `axum` feature, [`axum::enforce`] adapts it to an axum middleware.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod path;
pub mod request;
pub mod response;

#[cfg(feature = "axum")]
pub mod axum;

pub use config::{GateConfig, Strictness, DEFAULT_PROOF_HEADER};
pub use error::GateError;
pub use gate::{AgentIdentity, EnforcementGate, ErrorHandler, GateOutcome, Rejection, SuccessHook};
pub use request::GateRequest;
pub use response::{default_response, GateResponse};
