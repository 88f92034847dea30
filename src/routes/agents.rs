use axum::{
    Router,
    routing::{get, post},
    Json,
    extract::{Path, State},
};
use sqlx::PgPool;
use tracing::info;

use crate::agent::AgentRecord;
use crate::db::AgentRepository;
use crate::models::{AgentPaymentInfo, AppState};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agents", get(list_agents))
        .route("/api/agents/resolve", post(resolve_agent))
        .route("/api/agents/{id}/payment", get(agent_payment))
        .with_state(state)
}

/// POST /api/agents/resolve - Resolve fee and wallet for a client-supplied record
async fn resolve_agent(Json(agent): Json<AgentRecord>) -> Json<AgentPaymentInfo> {
    Json(AgentPaymentInfo::resolve(&agent))
}

/// GET /api/agents - Agents from the datastore
async fn list_agents(State(state): State<AppState>) -> AppResult<Json<Vec<AgentRecord>>> {
    let pool = require_pool(&state)?;
    let db = &state.config.database;

    let agents = AgentRepository::list_agents(pool, &db.agents_table, db.fetch_limit).await?;
    info!("Listing {} agents", agents.len());
    Ok(Json(agents))
}

/// GET /api/agents/{id}/payment - Fee and wallet for a stored agent
async fn agent_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AgentPaymentInfo>> {
    let pool = require_pool(&state)?;

    let agent = AgentRepository::get_agent(pool, &state.config.database.agents_table, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("agent {}", id)))?;

    Ok(Json(AgentPaymentInfo::resolve(&agent)))
}

pub(crate) fn require_pool(state: &AppState) -> AppResult<&PgPool> {
    state
        .pool
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("agent datastore is not configured".to_string()))
}
