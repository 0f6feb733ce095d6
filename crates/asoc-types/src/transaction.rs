use serde::{Deserialize, Serialize};

/// The transaction-specific facts a caller declares for one enforcement
/// check. Absent fields skip the matching constraint rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub target_server: Option<String>,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_target_server(mut self, server: impl Into<String>) -> Self {
        self.target_server = Some(server.into());
        self
    }

    /// Nothing declared, so no transaction rule applies.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.target_server.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let tx = TransactionContext::new()
            .with_value(25.0)
            .with_target_server("finance-node");
        assert_eq!(tx.value, Some(25.0));
        assert_eq!(tx.target_server.as_deref(), Some("finance-node"));
        assert!(!tx.is_empty());
        assert!(TransactionContext::new().is_empty());
    }
}
