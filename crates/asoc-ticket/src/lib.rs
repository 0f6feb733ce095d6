//! Audit ticket lifecycle: signing, verification, expiry and constraint
//! evaluation.
//!
//! ## Components
//!
//! - **TicketKey**: signing-key abstraction (`HmacKey` for HS256,
//!   `Ed25519Key` for EdDSA)
//! - **codec**: `sign`, `verify`, `decode_unsafe` over the three-segment
//!   `header.payload.signature` wire form
//! - **ConstraintEvaluator**: pure, fixed-order rule evaluation
//! - **TicketIssuer**: builds payloads, signs them, and validates tickets
//!   (embedded kill switch, transaction constraints, optional live registry)
//!
//! ## Verification order
//!
//! 1. Structural parse ⇒ `InvalidFormat`
//! 2. Algorithm + signature ⇒ `InvalidSignature`
//! 3. Issuer ⇒ `ValidationFailed`
//! 4. Expiry (`now >= exp`) ⇒ `Expired`
//! 5. Embedded kill switch ⇒ `KillSwitch` (issuer only)
//! 6. Transaction constraints ⇒ `ConstraintViolation` (issuer only)
//!
//! Every step returns a value. No input token can make validation panic or
//! return `Err`.

#![deny(unsafe_code)]

pub mod codec;
pub mod constraint;
pub mod error;
pub mod issuer;
pub mod key;

pub use codec::{decode_unsafe, sign, verify, verify_at, TicketHeader, TICKET_TYPE};
pub use constraint::{ConstraintEvaluator, ConstraintRule, ConstraintViolation};
pub use error::{KeyError, TicketError, TicketResult};
pub use issuer::{TicketIssuer, TicketRequest, DEFAULT_VALIDITY_SECS, MAX_VALIDITY_SECS};
pub use key::{Algorithm, Ed25519Key, HmacKey, TicketKey};
