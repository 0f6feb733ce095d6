use asoc_types::{AuditConstraints, TransactionContext};

/// Which rule rejected a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintRule {
    MaxOpValue,
    AllowedServers,
}

/// First failing rule and its human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub rule: ConstraintRule,
    pub message: String,
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Stateless evaluator for the fixed transaction rule set.
///
/// Rules run in order and the first failure wins:
///
/// 1. declared value must not exceed `max_op_value`
/// 2. declared target server must be whitelisted
///
/// A rule whose input was not declared is skipped.
pub struct ConstraintEvaluator;

impl ConstraintEvaluator {
    pub fn check(
        constraints: &AuditConstraints,
        tx: &TransactionContext,
    ) -> Result<(), ConstraintViolation> {
        if let Some(value) = tx.value {
            // NaN compares false against any limit.
            if !value.is_finite() {
                return Err(ConstraintViolation {
                    rule: ConstraintRule::MaxOpValue,
                    message: format!("Transaction value {} is not a finite number", value),
                });
            }
            if value > constraints.max_op_value() {
                return Err(ConstraintViolation {
                    rule: ConstraintRule::MaxOpValue,
                    message: format!(
                        "Transaction value {} exceeds limit {}",
                        value,
                        constraints.max_op_value()
                    ),
                });
            }
        }

        if let Some(server) = tx.target_server.as_deref() {
            if !constraints.allows_server(server) {
                return Err(ConstraintViolation {
                    rule: ConstraintRule::AllowedServers,
                    message: format!("{} not in allowed list", server),
                });
            }
        }

        Ok(())
    }
}
