//! Agent registry and trust handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use asoc_registry::{get_agent_with_timeout, AgentRegistry};
use asoc_types::{AgentId, AgentSnapshot, TrustScore};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Register or replace an agent snapshot
pub async fn register_agent(
    State(state): State<AppState>,
    Json(snapshot): Json<AgentSnapshot>,
) -> ApiResult<Json<AgentSnapshot>> {
    state.registry.upsert(snapshot.clone())?;

    tracing::info!(
        agent_id = %snapshot.agent_id,
        audit_level = %snapshot.audit_level,
        "Registered agent"
    );

    Ok(Json(snapshot))
}

/// Get an agent snapshot
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentSnapshot>> {
    let agent_id = AgentId::new(&id);
    let snapshot = get_agent_with_timeout(state.registry.as_ref(), &agent_id, state.registry_timeout())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Agent {} not found", id)))?;

    Ok(Json(snapshot))
}

/// Trust score query parameters
#[derive(Debug, Default, Deserialize)]
pub struct TrustQuery {
    #[serde(default)]
    pub detail: bool,
}

/// Compute an agent's trust score
pub async fn get_trust_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TrustQuery>,
) -> ApiResult<Json<TrustScore>> {
    let agent_id = AgentId::new(&id);
    let score = state
        .trust
        .compute_for(state.registry.as_ref(), &agent_id, query.detail)
        .await?;

    Ok(Json(score))
}

/// Kill switch request
#[derive(Debug, Deserialize)]
pub struct KillSwitchRequest {
    pub active: bool,
}

/// Kill switch response
#[derive(Debug, Serialize)]
pub struct KillSwitchResponse {
    pub agent_id: AgentId,
    pub kill_switch_active: bool,
}

/// Flip an agent's kill switch
pub async fn set_kill_switch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<KillSwitchRequest>,
) -> ApiResult<Json<KillSwitchResponse>> {
    let agent_id = AgentId::new(&id);
    state
        .registry
        .set_kill_switch(&agent_id, request.active)
        .await?;

    Ok(Json(KillSwitchResponse {
        agent_id,
        kill_switch_active: request.active,
    }))
}
