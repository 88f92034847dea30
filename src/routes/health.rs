use axum::{Router, routing::get, Json, extract::State, response::Json as ResponseJson};
use tracing::warn;

use crate::db;
use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let database = match &state.pool {
        Some(pool) => match db::health_check(pool).await {
            Ok(_) => "connected",
            Err(e) => {
                warn!("Database health check failed: {}", e);
                "unreachable"
            }
        },
        None => "disabled",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: database.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_without_database() {
        let (status, body) = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "disabled");
    }
}
