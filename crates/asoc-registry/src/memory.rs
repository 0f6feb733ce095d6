//! In-memory implementation of the registry trait
//!
//! Suitable for development and testing. Production deployments should use
//! a persistent backend.

use crate::agent::AgentRegistry;
use crate::error::{RegistryError, Result};
use asoc_types::{AgentId, AgentSnapshot, BehavioralMetrics};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory agent registry
pub struct InMemoryAgentRegistry {
    agents: DashMap<AgentId, AgentSnapshot>,
}

impl InMemoryAgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: DashMap::new(),
        }
    }

    /// Register a new agent snapshot
    pub fn register(&self, snapshot: AgentSnapshot) -> Result<AgentId> {
        snapshot.validate()?;
        let id = snapshot.agent_id.clone();

        if self.agents.contains_key(&id) {
            return Err(RegistryError::AgentAlreadyExists(id));
        }

        self.agents.insert(id.clone(), snapshot);
        tracing::debug!(agent_id = %id, "Registered agent");
        Ok(id)
    }

    /// Insert or replace a snapshot
    pub fn upsert(&self, snapshot: AgentSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.agents.insert(snapshot.agent_id.clone(), snapshot);
        Ok(())
    }

    /// Ingest fresh behavioral metrics for an agent
    pub fn record_metrics(&self, id: &AgentId, metrics: BehavioralMetrics) -> Result<()> {
        metrics.validate()?;
        if let Some(mut agent) = self.agents.get_mut(id) {
            agent.metrics = metrics;
            Ok(())
        } else {
            Err(RegistryError::AgentNotFound(id.clone()))
        }
    }

    /// List all snapshots
    pub fn list(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(|a| a.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for InMemoryAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRegistry for InMemoryAgentRegistry {
    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentSnapshot>> {
        Ok(self.agents.get(id).map(|a| a.clone()))
    }

    async fn set_kill_switch(&self, id: &AgentId, active: bool) -> Result<()> {
        // The entry guard holds the shard lock, so readers see either the
        // old or the new snapshot, never a mix.
        if let Some(mut agent) = self.agents.get_mut(id) {
            agent.kill_switch_active = active;
            agent.constraints = agent.constraints.clone().with_kill_switch(active);
            tracing::warn!(agent_id = %id, active, "Kill switch updated");
            Ok(())
        } else {
            Err(RegistryError::AgentNotFound(id.clone()))
        }
    }
}
