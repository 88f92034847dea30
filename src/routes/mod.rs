//! API Routes
//!
//! - `/api/health` - Health check, including datastore reachability
//! - `/api/agents` - Stored agents and their resolved fee/wallet
//! - `/api/markers/layout` - AR overlay marker positions
//! - `/api/payment-sessions` - Payment session lifecycle

pub mod agents;
pub mod health;
pub mod markers;
pub mod sessions;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(agents::router(state.clone()))
        .merge(markers::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(health::router(state));

    apply_cors(api_router, &origins).layer(TraceLayer::new_for_http())
}
