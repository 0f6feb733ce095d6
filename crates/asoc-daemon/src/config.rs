//! Configuration for asoc-daemon

use std::net::SocketAddr;
use std::sync::Arc;

use asoc_gate::GateConfig;
use asoc_ticket::{
    Algorithm, Ed25519Key, HmacKey, TicketKey, DEFAULT_VALIDITY_SECS, MAX_VALIDITY_SECS,
};
use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, DaemonResult};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ticket authority configuration
    #[serde(default)]
    pub ticket: TicketConfig,

    /// Enforcement gate configuration
    #[serde(default)]
    pub gate: GateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Ticket authority configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// `iss` written into and required of every ticket
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Signing algorithm
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,

    /// HS256: the shared secret (at least 32 bytes).
    /// EdDSA: the 32-byte seed as hex.
    /// When unset an ephemeral key is generated at startup.
    #[serde(default)]
    pub secret: Option<String>,

    /// Validity applied when an issue request does not specify one
    #[serde(default = "default_validity")]
    pub default_validity_secs: u64,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            algorithm: default_algorithm(),
            secret: None,
            default_validity_secs: default_validity(),
        }
    }
}

impl std::fmt::Debug for TicketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("default_validity_secs", &self.default_validity_secs)
            .finish()
    }
}

impl TicketConfig {
    /// Build the signing key described by this configuration.
    pub fn signing_key(&self) -> DaemonResult<Arc<dyn TicketKey>> {
        let key: Arc<dyn TicketKey> = match (self.algorithm, self.secret.as_deref()) {
            (Algorithm::HS256, Some(secret)) => Arc::new(HmacKey::new(secret.as_bytes().to_vec())?),
            (Algorithm::HS256, None) => {
                tracing::warn!("No ticket secret configured; using an ephemeral HS256 key");
                Arc::new(HmacKey::generate())
            }
            (Algorithm::EdDSA, Some(seed_hex)) => Arc::new(Ed25519Key::from_seed_hex(seed_hex)?),
            (Algorithm::EdDSA, None) => {
                let key = Ed25519Key::generate();
                tracing::warn!(
                    public_key = %key.public_key_hex(),
                    "No ticket seed configured; using an ephemeral Ed25519 key"
                );
                Arc::new(key)
            }
        };
        Ok(key)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8090))
}

fn default_issuer() -> String {
    "asoc-authority".to_string()
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}

fn default_validity() -> u64 {
    DEFAULT_VALIDITY_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `ASOC_`-prefixed environment variables (`ASOC_TICKET__ISSUER`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Add environment variables with ASOC_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("ASOC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject configurations the daemon cannot start with.
    pub fn validate(&self) -> DaemonResult<()> {
        if self.ticket.issuer.trim().is_empty() {
            return Err(DaemonError::Config("ticket.issuer must not be empty".into()));
        }
        if self.ticket.default_validity_secs == 0
            || self.ticket.default_validity_secs > MAX_VALIDITY_SECS
        {
            return Err(DaemonError::Config(format!(
                "ticket.default_validity_secs must be between 1 and {}",
                MAX_VALIDITY_SECS
            )));
        }
        self.gate.validate()?;
        Ok(())
    }
}
