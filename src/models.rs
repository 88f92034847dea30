use sqlx::PgPool;

use crate::agent::AgentRecord;
use crate::config::Config;
use crate::layout::{MarkerLayout, ViewerLocation};
use crate::payment::{
    format_address, resolve_fee, resolve_wallet, FeeResolution, PaymentMethod,
    PaymentSessionStore, PaymentStatus, WalletResolution,
};

#[derive(Clone)]
pub struct AppState {
    /// Agent datastore; `None` when no `DATABASE_URL` is configured
    pub pool: Option<PgPool>,
    pub config: Config,
    pub sessions: PaymentSessionStore,
    pub layout: MarkerLayout,
}

impl AppState {
    pub fn new(pool: Option<PgPool>, config: Config) -> Self {
        let sessions = PaymentSessionStore::new(config.payment.session_ttl_secs);
        let layout = MarkerLayout::new(config.layout.max_visible);
        Self {
            pool,
            config,
            sessions,
            layout,
        }
    }
}

// API request and response bodies

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPaymentInfo {
    pub fee: FeeResolution,
    pub wallet: WalletResolution,
    pub fee_display: String,
    pub wallet_display: String,
    pub wallet_configured: bool,
}

impl AgentPaymentInfo {
    pub fn resolve(agent: &AgentRecord) -> Self {
        let fee = resolve_fee(agent);
        let wallet = resolve_wallet(agent);
        Self {
            fee_display: fee.display(),
            wallet_display: format_address(&wallet.address),
            wallet_configured: wallet.is_configured(),
            fee,
            wallet,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
    pub viewer: Option<ViewerLocation>,
    pub max_visible: Option<usize>,
    /// Fixes the grid jitter for reproducible layouts
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub agent: AgentRecord,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateSessionStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_info_for_bare_agent() {
        let info = AgentPaymentInfo::resolve(&AgentRecord::default());
        assert_eq!(info.fee_display, "1 USDC");
        assert_eq!(info.wallet_display, "No wallet configured");
        assert!(!info.wallet_configured);
    }

    #[test]
    fn test_layout_request_defaults() {
        let request: LayoutRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.agents.is_empty());
        assert!(request.viewer.is_none());
        assert!(request.seed.is_none());

        let request: LayoutRequest = serde_json::from_value(json!({
            "agents": [{ "id": "a", "lat": "1.5", "lng": 2 }],
            "viewer": { "latitude": 1.5, "longitude": 2.0 },
            "maxVisible": 3,
            "seed": 9
        }))
        .unwrap();
        assert_eq!(request.agents[0].coordinates(), Some((1.5, 2.0)));
        assert_eq!(request.max_visible, Some(3));
    }

    #[test]
    fn test_state_uses_config() {
        let mut config = Config::default();
        config.layout.max_visible = 4;
        let state = AppState::new(None, config);
        assert_eq!(state.layout.max_visible, 4);
        assert!(state.pool.is_none());
    }
}
