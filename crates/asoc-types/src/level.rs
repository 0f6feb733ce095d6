use serde::{Deserialize, Serialize};

/// Coarse trust tier attached to an agent and embedded in its tickets.
///
/// Informational only: a level never widens what a ticket permits, the
/// embedded constraints do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Bronze => "bronze",
            AuditLevel::Silver => "silver",
            AuditLevel::Gold => "gold",
            AuditLevel::Platinum => "platinum",
        }
    }
}

impl std::fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bronze" => Ok(AuditLevel::Bronze),
            "silver" => Ok(AuditLevel::Silver),
            "gold" => Ok(AuditLevel::Gold),
            "platinum" => Ok(AuditLevel::Platinum),
            other => Err(format!("unknown audit level: {}", other)),
        }
    }
}
