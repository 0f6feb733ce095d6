//! Trust score computation.

use std::time::Duration;

use asoc_registry::{get_agent_with_timeout, AgentRegistry, DEFAULT_REGISTRY_TIMEOUT};
use asoc_types::{AgentId, AgentSnapshot, Recommendation, TrustFactors, TrustScore};
use chrono::{DateTime, Utc};

use crate::error::TrustResult;

/// Transaction count at which the history factor saturates.
const HISTORY_SATURATION: f64 = 10_000.0;

/// Highest certification review depth.
const MAX_MVA_LEVEL: f64 = 5.0;

/// Stateless trust score calculator.
#[derive(Debug, Clone)]
pub struct TrustScoreCalculator {
    registry_timeout: Duration,
}

impl TrustScoreCalculator {
    pub fn new() -> Self {
        Self {
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }

    /// Bound on each registry read made by [`compute_for`](Self::compute_for).
    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = timeout;
        self
    }

    /// Score an agent from an already loaded snapshot.
    ///
    /// `None` means the registry does not know the agent.
    pub fn compute(
        &self,
        agent_id: &AgentId,
        snapshot: Option<&AgentSnapshot>,
        include_detail: bool,
    ) -> TrustScore {
        self.compute_at(agent_id, snapshot, include_detail, Utc::now())
    }

    pub fn compute_at(
        &self,
        agent_id: &AgentId,
        snapshot: Option<&AgentSnapshot>,
        include_detail: bool,
        now: DateTime<Utc>,
    ) -> TrustScore {
        let Some(snapshot) = snapshot else {
            tracing::debug!(agent_id = %agent_id, "Trust score requested for unknown agent");
            return TrustScore {
                computed_at: now,
                ..TrustScore::unknown(agent_id.clone())
            };
        };

        TrustScore {
            agent_id: snapshot.agent_id.clone(),
            score: snapshot.trust_score,
            tier: Some(snapshot.audit_level),
            factors: include_detail.then(|| Self::factors(snapshot)),
            recommendation: Recommendation::from_score(snapshot.trust_score),
            computed_at: now,
        }
    }

    /// Read the agent from `registry` and score it.
    pub async fn compute_for(
        &self,
        registry: &dyn AgentRegistry,
        agent_id: &AgentId,
        include_detail: bool,
    ) -> TrustResult<TrustScore> {
        let snapshot = get_agent_with_timeout(registry, agent_id, self.registry_timeout)
            .await
            .map_err(|e| {
                tracing::error!(agent_id = %agent_id, error = %e, "Trust score registry read failed");
                e
            })?;

        Ok(self.compute(agent_id, snapshot.as_ref(), include_detail))
    }

    /// Factor breakdown for a snapshot.
    pub fn factors(snapshot: &AgentSnapshot) -> TrustFactors {
        TrustFactors {
            certification: Self::certification_factor(snapshot),
            behavioral: Self::behavioral_factor(snapshot),
            transaction_history: Self::history_factor(snapshot),
            domain: if snapshot.verified_domain.is_some() {
                100.0
            } else {
                50.0
            },
        }
    }

    fn certification_factor(snapshot: &AgentSnapshot) -> f64 {
        if snapshot.kill_switch_active {
            return 0.0;
        }
        snapshot
            .certification
            .as_ref()
            .map(|cert| f64::from(cert.mva_level) / MAX_MVA_LEVEL * 100.0)
            .unwrap_or(0.0)
    }

    fn behavioral_factor(snapshot: &AgentSnapshot) -> f64 {
        let m = &snapshot.metrics;
        let latency = (100.0 - m.avg_latency_ms / 5.0).max(0.0);
        m.uptime_percent * 0.4 + (1.0 - m.error_rate) * 100.0 * 0.3 + latency * 0.3
    }

    fn history_factor(snapshot: &AgentSnapshot) -> f64 {
        (snapshot.metrics.total_transactions as f64 / HISTORY_SATURATION * 100.0).min(100.0)
    }
}

impl Default for TrustScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}
