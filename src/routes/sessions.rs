use axum::{
    Router,
    routing::{get, post},
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::models::{AppState, CreateSessionRequest, UpdateSessionStatusRequest};
use crate::payment::PaymentSession;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/payment-sessions", post(create_session))
        .route("/api/payment-sessions/{id}", get(get_session))
        .route("/api/payment-sessions/{id}/status", post(update_status))
        .route("/api/agents/{id}/payment-sessions", get(agent_sessions))
        .with_state(state)
}

/// POST /api/payment-sessions - Open a session for an agent
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<PaymentSession>) {
    let session = state
        .sessions
        .create(&request.agent, request.payment_method)
        .await;
    (StatusCode::CREATED, Json(session))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PaymentSession>> {
    Ok(Json(state.sessions.get(id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSessionStatusRequest>,
) -> AppResult<Json<PaymentSession>> {
    Ok(Json(state.sessions.update_status(id, request.status).await?))
}

async fn agent_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<PaymentSession>> {
    Json(state.sessions.list_for_agent(&id).await)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app();
        let body = json!({
            "agent": {
                "id": "agent-9",
                "interactionFeeAmount": 0,
                "interactionFeeUsdfc": 4,
                "userId": "user-123"
            },
            "paymentMethod": "crypto_qr"
        });

        let (status, session) = send(&app, "POST", "/api/payment-sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["status"], "pending");
        assert_eq!(session["fee"]["amount"], 4.0);
        assert_eq!(session["fee"]["source"], "interactionFeeUsdfc");
        assert_eq!(session["recipient"]["source"], "none");

        let id = session["id"].as_str().unwrap().to_string();
        let uri = format!("/api/payment-sessions/{}", id);
        let (status, fetched) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id);

        let status_uri = format!("/api/payment-sessions/{}/status", id);
        let (status, updated) =
            send(&app, "POST", &status_uri, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "completed");

        let (status, _) =
            send(&app, "POST", &status_uri, Some(json!({ "status": "processing" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = send(&app, "GET", "/api/agents/agent-9/payment-sessions", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let uri = format!("/api/payment-sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app(), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("Not found"));
    }
}
