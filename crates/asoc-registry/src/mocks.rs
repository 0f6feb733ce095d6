use std::time::Duration;

use async_trait::async_trait;

use crate::agent::AgentRegistry;
use crate::error::{RegistryError, Result};
use asoc_types::{AgentId, AgentSnapshot};

/// Registry whose backend is down. Every call fails.
pub struct UnavailableAgentRegistry {
    reason: String,
}

impl UnavailableAgentRegistry {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AgentRegistry for UnavailableAgentRegistry {
    async fn get_agent(&self, _id: &AgentId) -> Result<Option<AgentSnapshot>> {
        Err(RegistryError::Unavailable(self.reason.clone()))
    }

    async fn set_kill_switch(&self, _id: &AgentId, _active: bool) -> Result<()> {
        Err(RegistryError::Unavailable(self.reason.clone()))
    }
}

/// Registry that answers only after `delay`. Used to exercise timeouts.
pub struct StalledAgentRegistry {
    delay: Duration,
}

impl StalledAgentRegistry {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AgentRegistry for StalledAgentRegistry {
    async fn get_agent(&self, _id: &AgentId) -> Result<Option<AgentSnapshot>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn set_kill_switch(&self, _id: &AgentId, _active: bool) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::get_agent_with_timeout;

    #[tokio::test]
    async fn unavailable_registry_errors() {
        let registry = UnavailableAgentRegistry::new("connection refused");
        let err = registry.get_agent(&AgentId::new("a")).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_registry_times_out() {
        let registry = StalledAgentRegistry::new(Duration::from_secs(60));
        let err = get_agent_with_timeout(&registry, &AgentId::new("a"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Timeout(50)));
    }
}
