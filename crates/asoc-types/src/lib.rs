//! Core type definitions for ASOC.
//!
//! This crate holds the shared vocabulary of the ticket engine: audit levels,
//! constraint sets, the signed claim set, validation outcomes, transaction
//! contexts, agent snapshots and derived trust scores. No business logic
//! beyond construction-time invariants lives here.
//!
//! ## Invariants enforced by construction
//!
//! - `AuditConstraints::max_op_value` is finite and strictly positive.
//! - `AuditTicketPayload::expires_at` is strictly after `issued_at`; both are
//!   whole Unix seconds so the wire encoding round-trips exactly.
//! - Both invariants are re-checked when a payload is deserialized.

#![deny(unsafe_code)]

pub mod agent;
pub mod constraints;
pub mod error;
pub mod ids;
pub mod level;
pub mod ticket;
pub mod transaction;
pub mod trust;
pub mod validation;

pub use agent::{AgentSnapshot, BehavioralMetrics, Certification};
pub use constraints::AuditConstraints;
pub use error::TypeError;
pub use ids::AgentId;
pub use level::AuditLevel;
pub use ticket::{AuditTicketPayload, Metadata, SignedTicket};
pub use transaction::TransactionContext;
pub use trust::{Recommendation, TrustFactors, TrustScore};
pub use validation::{ErrorKind, ValidationResult};
