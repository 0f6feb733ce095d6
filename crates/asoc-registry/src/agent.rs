//! Agent registry trait
//!
//! The AgentRegistry is the injected capability through which the core
//! reads agent state. It is never global.

use std::time::Duration;

use crate::error::{RegistryError, Result};
use asoc_types::{AgentId, AgentSnapshot};
use async_trait::async_trait;

/// Default bound on a single registry call made by the core.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(2);

/// Registry of agent snapshots
#[async_trait]
pub trait AgentRegistry: Send + Sync {
    /// Get the current snapshot for an agent, `None` if unknown
    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentSnapshot>>;

    /// Flip the agent's kill switch.
    ///
    /// Must be a single in-place update, atomic with respect to
    /// concurrent `get_agent` calls.
    async fn set_kill_switch(&self, id: &AgentId, active: bool) -> Result<()>;
}

/// Read an agent, bounding the call by `timeout`.
pub async fn get_agent_with_timeout(
    registry: &dyn AgentRegistry,
    id: &AgentId,
    timeout: Duration,
) -> Result<Option<AgentSnapshot>> {
    match tokio::time::timeout(timeout, registry.get_agent(id)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(agent_id = %id, timeout_ms = timeout.as_millis() as u64, "Registry read timed out");
            Err(RegistryError::Timeout(timeout.as_millis() as u64))
        }
    }
}
