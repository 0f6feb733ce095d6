//! ASOC Registry - agent snapshot store consumed by the ticket core
//!
//! The durable agent registry is an external collaborator. The core only
//! needs two operations from it:
//!
//! - **get_agent**: read the current `AgentSnapshot` for an id
//! - **set_kill_switch**: flip an agent's emergency cutoff in place
//!
//! ## In-Memory vs Persistent
//!
//! The crate provides an in-memory implementation suitable for development
//! and testing. Production deployments should put a relational store behind
//! the same trait. Every call the core makes goes through
//! [`get_agent_with_timeout`] so a slow backend surfaces as
//! [`RegistryError::Timeout`] instead of hanging a request.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod agent;
pub mod error;
pub mod memory;
pub mod mocks;

// Re-exports
pub use agent::{get_agent_with_timeout, AgentRegistry, DEFAULT_REGISTRY_TIMEOUT};
pub use error::{RegistryError, Result};
pub use memory::InMemoryAgentRegistry;
pub use mocks::{StalledAgentRegistry, UnavailableAgentRegistry};
