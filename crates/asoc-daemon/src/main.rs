//! ASOC Daemon - audit ticket authority
//!
//! The ASOC daemon provides:
//! - Ticket issuance and validation over REST
//! - An in-memory agent registry with kill switch control
//! - Trust scores derived from registry snapshots
//! - A gated transaction endpoint demonstrating enforcement

use asoc_daemon::error::{DaemonError, DaemonResult};
use asoc_daemon::{DaemonConfig, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ASOC Daemon CLI
#[derive(Parser)]
#[command(name = "asocd")]
#[command(about = "ASOC Daemon - audit ticket authority and enforcement gate", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ASOC_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "ASOC_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "ASOC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "ASOC_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = cli.listen.as_deref() {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
     _    ____   ___   ____
    / \  / ___| / _ \ / ___|
   / _ \ \___ \| | | | |
  / ___ \ ___) | |_| | |___
 /_/   \_\____/ \___/ \____|

  Audit ticket authority
  Version: {}
  Issuer: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.ticket.issuer,
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await
}
