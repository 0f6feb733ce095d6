//! ASOC Daemon library
//!
//! This module provides the core components for the ASOC daemon:
//! - REST API handlers for ticket issuance, validation and inspection
//! - Agent registry, kill switch and trust score endpoints
//! - A transaction route protected by the enforcement gate
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::rest::state::AppState;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
