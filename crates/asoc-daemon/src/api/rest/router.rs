//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    // Ticket-protected routes
    let protected = Router::new()
        .route("/transactions", post(handlers::create_transaction))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            asoc_gate::axum::enforce,
        ));

    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Tickets
        .route("/tickets", post(handlers::issue_ticket))
        .route("/tickets/validate", post(handlers::validate_ticket))
        .route("/tickets/inspect", post(handlers::inspect_ticket))
        // Agents
        .route("/agents", put(handlers::register_agent))
        .route("/agents/:id", get(handlers::get_agent))
        .route("/agents/:id/trust", get(handlers::get_trust_score))
        .route("/agents/:id/kill-switch", post(handlers::set_kill_switch))
        .merge(protected);

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
