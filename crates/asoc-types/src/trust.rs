use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AgentId;
use crate::level::AuditLevel;

/// Score at or above which an agent is approved.
pub const APPROVE_THRESHOLD: f64 = 80.0;

/// Score at or above which an agent is sent to review rather than rejected.
pub const REVIEW_THRESHOLD: f64 = 60.0;

/// What a caller should do with an agent, derived from its score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Review,
    Reject,
}

impl Recommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= APPROVE_THRESHOLD {
            Recommendation::Approve
        } else if score >= REVIEW_THRESHOLD {
            Recommendation::Review
        } else {
            Recommendation::Reject
        }
    }
}

/// Diagnostic factor breakdown. Not the scoring formula itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustFactors {
    pub certification: f64,
    pub behavioral: f64,
    pub transaction_history: f64,
    pub domain: f64,
}

/// Derived trust summary, recomputed on demand and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    pub agent_id: AgentId,
    pub score: f64,
    pub tier: Option<AuditLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<TrustFactors>,
    pub recommendation: Recommendation,
    pub computed_at: DateTime<Utc>,
}

impl TrustScore {
    /// Zero score for an agent the registry does not know.
    pub fn unknown(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            score: 0.0,
            tier: None,
            factors: None,
            recommendation: Recommendation::Reject,
            computed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_boundaries() {
        assert_eq!(Recommendation::from_score(100.0), Recommendation::Approve);
        assert_eq!(Recommendation::from_score(80.0), Recommendation::Approve);
        assert_eq!(Recommendation::from_score(79.9), Recommendation::Review);
        assert_eq!(Recommendation::from_score(60.0), Recommendation::Review);
        assert_eq!(Recommendation::from_score(59.9), Recommendation::Reject);
        assert_eq!(Recommendation::from_score(0.0), Recommendation::Reject);
    }

    #[test]
    fn unknown_agent_scores_zero() {
        let score = TrustScore::unknown(AgentId::new("ghost"));
        assert_eq!(score.score, 0.0);
        assert_eq!(score.recommendation, Recommendation::Reject);
        assert!(score.tier.is_none());
        assert!(score.factors.is_none());
    }
}
