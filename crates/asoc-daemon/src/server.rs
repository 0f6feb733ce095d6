//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use asoc_gate::EnforcementGate;
use asoc_registry::InMemoryAgentRegistry;
use asoc_ticket::TicketIssuer;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// ASOC Daemon Server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;

        let key = config.ticket.signing_key()?;
        let issuer = Arc::new(
            TicketIssuer::new(key, config.ticket.issuer.clone())
                .with_default_validity(config.ticket.default_validity_secs),
        );

        let registry = Arc::new(InMemoryAgentRegistry::new());

        let gate = EnforcementGate::builder(issuer.clone(), config.gate.clone())
            .registry(registry.clone())
            .build()?;

        let state = AppState::new(issuer, registry, gate);

        Ok(Self { config, state })
    }

    /// Shared state, for seeding the registry before `run`
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router serving the API
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.config.server.enable_cors)
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = self.router();

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("ASOC daemon listening on {}", addr);
        tracing::info!(
            issuer = %self.state.issuer.issuer(),
            algorithm = %self.state.issuer.algorithm(),
            strictness = ?self.config.gate.strictness,
            "Ticket authority ready"
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("ASOC daemon shutting down");

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
