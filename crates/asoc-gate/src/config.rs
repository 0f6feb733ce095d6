use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Header carrying the audit ticket unless configured otherwise.
pub const DEFAULT_PROOF_HEADER: &str = "X-ASOC-Proof";

/// How much the gate trusts the ticket on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Trust the kill switch baked into the ticket at issuance.
    #[default]
    Embedded,
    /// Additionally re-read the agent from the registry on every request.
    LiveRegistry,
}

/// Gate configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Request header carrying the ticket (matched case-insensitively)
    pub header_name: String,
    /// Reject requests without a ticket (default: true)
    pub require_proof: bool,
    /// Dotted path of the transaction value in the JSON body
    pub value_field: String,
    /// Dotted path of the target server in the JSON body
    pub server_field: String,
    /// Where agents obtain tickets; echoed in 402 responses
    pub issuer_endpoint: String,
    /// Documentation link echoed in 402 responses
    pub documentation: String,
    pub strictness: Strictness,
    /// Bound on each registry read in live mode
    pub registry_timeout_ms: u64,
    /// Largest request body the axum middleware will buffer
    pub body_limit_bytes: usize,
    /// Admit ticketed requests whose body is not JSON, skipping constraint
    /// checks. Off by default: such requests are rejected.
    pub allow_non_json_body: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_PROOF_HEADER.to_string(),
            require_proof: true,
            value_field: "amount".to_string(),
            server_field: "mcp_server".to_string(),
            issuer_endpoint: "/api/v1/tickets".to_string(),
            documentation: "https://docs.asoc.dev/audit-tickets".to_string(),
            strictness: Strictness::Embedded,
            registry_timeout_ms: 2_000,
            body_limit_bytes: 1024 * 1024,
            allow_non_json_body: false,
        }
    }
}

impl GateConfig {
    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), GateError> {
        let name = self.header_name.as_str();
        let token_char = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
        if name.is_empty() || !name.chars().all(token_char) {
            return Err(GateError::InvalidHeaderName(self.header_name.clone()));
        }
        if self.value_field.trim().is_empty() {
            return Err(GateError::EmptyFieldPath { field: "value_field" });
        }
        if self.server_field.trim().is_empty() {
            return Err(GateError::EmptyFieldPath {
                field: "server_field",
            });
        }
        if self.strictness == Strictness::LiveRegistry && self.registry_timeout_ms == 0 {
            return Err(GateError::ZeroRegistryTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GateConfig::default();
        assert_eq!(config.header_name, "X-ASOC-Proof");
        assert!(config.require_proof);
        assert_eq!(config.value_field, "amount");
        assert_eq!(config.server_field, "mcp_server");
        assert_eq!(config.strictness, Strictness::Embedded);
        assert_eq!(config.registry_timeout(), Duration::from_secs(2));
        assert!(!config.allow_non_json_body);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: GateConfig =
            serde_json::from_str(r#"{"require_proof": false, "strictness": "live_registry"}"#)
                .unwrap();
        assert!(!config.require_proof);
        assert_eq!(config.strictness, Strictness::LiveRegistry);
        assert_eq!(config.header_name, DEFAULT_PROOF_HEADER);
    }

    #[test]
    fn rejects_bad_header_and_paths() {
        let mut config = GateConfig::default();
        config.header_name = "X Proof".into();
        assert!(matches!(config.validate(), Err(GateError::InvalidHeaderName(_))));

        let mut config = GateConfig::default();
        config.value_field = " ".into();
        assert_eq!(
            config.validate(),
            Err(GateError::EmptyFieldPath { field: "value_field" })
        );
    }

    #[test]
    fn live_mode_needs_a_timeout() {
        let config = GateConfig {
            strictness: Strictness::LiveRegistry,
            registry_timeout_ms: 0,
            ..GateConfig::default()
        };
        assert_eq!(config.validate(), Err(GateError::ZeroRegistryTimeout));
    }
}
