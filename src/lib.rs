// AR Agent Market - fee/wallet resolution, AR marker layout and payment sessions

pub mod config;
pub mod db;
pub mod models;
pub mod types;
pub mod agent;
pub mod payment;
pub mod layout;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use agent::AgentRecord;
pub use config::Config;
pub use layout::{MarkerLayout, ScreenMarker, ViewerLocation};
pub use models::AppState;
pub use payment::{resolve_fee, resolve_wallet, FeeResolution, WalletResolution};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
