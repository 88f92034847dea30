use axum::{Router, routing::post, Json, extract::State};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::layout::{MarkerLayout, ScreenMarker};
use crate::models::{AppState, LayoutRequest};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/markers/layout", post(layout_markers))
        .with_state(state)
}

/// POST /api/markers/layout - Screen positions for the AR overlay
async fn layout_markers(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Json<Vec<ScreenMarker>> {
    let layout = request
        .max_visible
        .map(MarkerLayout::new)
        .unwrap_or(state.layout);

    let markers = match request.seed {
        Some(seed) => layout.layout_seeded(&request.agents, request.viewer, seed),
        None => layout.layout(&request.agents, request.viewer, &mut StdRng::from_entropy()),
    };

    Json(markers)
}
