//! Agent snapshot types
//!
//! An `AgentSnapshot` is the read model the registry hands to the core.
//! The core never mutates it; the registry owns kill-switch flips and
//! health ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraints::AuditConstraints;
use crate::error::TypeError;
use crate::ids::AgentId;
use crate::level::AuditLevel;

/// Point-in-time view of a registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identifier (ticket subject)
    pub agent_id: AgentId,

    /// Owning organization
    pub organization: String,

    /// Current audit tier
    pub audit_level: AuditLevel,

    /// Composite trust score, 0-100
    pub trust_score: f64,

    /// Verified domain, if any
    #[serde(default)]
    pub verified_domain: Option<String>,

    /// Current certification window
    #[serde(default)]
    pub certification: Option<Certification>,

    /// Behavioral health metrics
    #[serde(default)]
    pub metrics: BehavioralMetrics,

    /// Live emergency cutoff
    #[serde(default)]
    pub kill_switch_active: bool,

    /// Constraint template used when issuing tickets for this agent
    pub constraints: AuditConstraints,
}

/// Certification backing an agent's audit level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub certified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issuer: String,
    /// Depth of certification review, 1-5
    pub mva_level: u8,
}

/// Behavioral metrics ingested from health monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    /// Uptime percentage, 0-100
    pub uptime_percent: f64,
    /// Average response latency in milliseconds
    pub avg_latency_ms: f64,
    /// Error rate as a fraction, 0-1
    pub error_rate: f64,
    /// Lifetime transaction count
    pub total_transactions: u64,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl Default for BehavioralMetrics {
    fn default() -> Self {
        Self {
            uptime_percent: 0.0,
            avg_latency_ms: 0.0,
            error_rate: 0.0,
            total_transactions: 0,
            last_active: None,
        }
    }
}

impl BehavioralMetrics {
    pub fn validate(&self) -> Result<(), TypeError> {
        if !(0.0..=100.0).contains(&self.uptime_percent) {
            return Err(TypeError::InvalidSnapshot(format!(
                "uptime_percent {} outside 0-100",
                self.uptime_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(TypeError::InvalidSnapshot(format!(
                "error_rate {} outside 0-1",
                self.error_rate
            )));
        }
        if !self.avg_latency_ms.is_finite() || self.avg_latency_ms < 0.0 {
            return Err(TypeError::InvalidSnapshot(format!(
                "avg_latency_ms {} must be a non-negative number",
                self.avg_latency_ms
            )));
        }
        Ok(())
    }
}

impl AgentSnapshot {
    /// Check ranges the registry is expected to uphold.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.agent_id.is_empty() {
            return Err(TypeError::InvalidSnapshot("agent_id is empty".into()));
        }
        if !(0.0..=100.0).contains(&self.trust_score) {
            return Err(TypeError::InvalidSnapshot(format!(
                "trust_score {} outside 0-100",
                self.trust_score
            )));
        }
        if let Some(cert) = &self.certification {
            if !(1..=5).contains(&cert.mva_level) {
                return Err(TypeError::InvalidSnapshot(format!(
                    "mva_level {} outside 1-5",
                    cert.mva_level
                )));
            }
        }
        self.metrics.validate()
    }

    /// Constraint template with the live kill switch applied.
    pub fn effective_constraints(&self) -> AuditConstraints {
        self.constraints
            .clone()
            .with_kill_switch(self.kill_switch_active || self.constraints.kill_switch_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot() -> AgentSnapshot {
        AgentSnapshot {
            agent_id: AgentId::new("agent-1"),
            organization: "Acme".into(),
            audit_level: AuditLevel::Silver,
            trust_score: 72.0,
            verified_domain: None,
            certification: None,
            metrics: BehavioralMetrics::default(),
            kill_switch_active: false,
            constraints: AuditConstraints::new(100.0, ["finance-node"]).unwrap(),
        }
    }

    #[test]
    fn valid_snapshot_passes() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn out_of_range_fields_fail() {
        let mut s = snapshot();
        s.trust_score = 101.0;
        assert!(s.validate().is_err());

        let mut s = snapshot();
        s.metrics.error_rate = 1.5;
        assert!(s.validate().is_err());

        let mut s = snapshot();
        s.certification = Some(Certification {
            certified_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(365),
            issuer: "auditor".into(),
            mva_level: 6,
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn effective_constraints_follow_live_switch() {
        let mut s = snapshot();
        assert!(!s.effective_constraints().kill_switch_active());
        s.kill_switch_active = true;
        assert!(s.effective_constraints().kill_switch_active());
    }
}
