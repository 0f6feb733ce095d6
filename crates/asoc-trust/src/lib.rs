//! ASOC Trust - composite trust scores for registered agents
//!
//! A [`TrustScore`](asoc_types::TrustScore) is derived on demand from an
//! [`AgentSnapshot`](asoc_types::AgentSnapshot) and never persisted. The
//! overall score and tier come straight from the snapshot; the four factor
//! scores are a diagnostic breakdown:
//!
//! | Factor | Formula |
//! |--------|---------|
//! | certification | `0` under a kill switch, else `mva_level / 5 * 100` |
//! | behavioral | `uptime * 0.4 + (1 - error_rate) * 30 + max(0, 100 - latency_ms / 5) * 0.3` |
//! | transaction history | `min(100, total_transactions / 100)` |
//! | domain | `100` with a verified domain, else `50` |
//!
//! An unknown agent scores zero with a `reject` recommendation. Only a
//! failing or slow registry is an error.

#![deny(unsafe_code)]

pub mod calculator;
pub mod error;

pub use calculator::TrustScoreCalculator;
pub use error::{TrustError, TrustResult};
