use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use ar_agent_market::{config::Config, routes::create_router, utils::init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // The agent datastore is optional
    let pool = if config.database.url.is_some() {
        let pool = ar_agent_market::db::create_pool(&config.database).await?;
        info!("Connected to agent datastore (table {})", config.database.agents_table);
        Some(pool)
    } else {
        warn!("DATABASE_URL not set; datastore-backed routes are disabled");
        None
    };

    let state = AppState::new(pool, config.clone());
    let app = create_router(state);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
