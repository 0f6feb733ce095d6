//! Application state for API handlers

use std::sync::Arc;
use std::time::Duration;

use asoc_gate::{EnforcementGate, Strictness};
use asoc_registry::InMemoryAgentRegistry;
use asoc_ticket::TicketIssuer;
use asoc_trust::TrustScoreCalculator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ticket issuer and validator
    pub issuer: Arc<TicketIssuer>,

    /// Agent registry
    pub registry: Arc<InMemoryAgentRegistry>,

    /// Trust score calculator
    pub trust: TrustScoreCalculator,

    /// Gate protecting transaction routes
    pub gate: EnforcementGate,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        issuer: Arc<TicketIssuer>,
        registry: Arc<InMemoryAgentRegistry>,
        gate: EnforcementGate,
    ) -> Self {
        let trust = TrustScoreCalculator::new().with_registry_timeout(gate.config().registry_timeout());
        Self {
            issuer,
            registry,
            trust,
            gate,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Bound on registry reads made by handlers
    pub fn registry_timeout(&self) -> Duration {
        self.gate.config().registry_timeout()
    }

    /// Whether ticket validation re-checks the live registry
    pub fn live_validation(&self) -> bool {
        self.gate.config().strictness == Strictness::LiveRegistry
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
