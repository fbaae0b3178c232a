mod config;
mod game;
mod net;
mod services;
mod util;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::game::constants::map as map_consts;
use crate::game::map;
use crate::net::game_loop;
use crate::net::host::WorldHost;
use crate::net::routes::{self, AppState};
use crate::services::analytics::AnalyticsService;
use crate::services::directory::PlayerDirectory;
use crate::services::state_client::PlayerStateClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Gridshot Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: {}:{}, analytics {}",
        config.bind_address,
        config.port,
        if config.analytics.is_active() { "on" } else { "off" }
    );

    // Generate the shared world grid once per process
    let grid = Arc::new(map::generate(
        map_consts::WIDTH,
        map_consts::HEIGHT,
        &mut rand::thread_rng(),
    ));
    info!(
        "World grid generated: {}x{}, {} open cells",
        grid.width(),
        grid.height(),
        grid.open_count()
    );

    // Shared state
    let analytics = AnalyticsService::start(config.analytics.clone());
    let host = Arc::new(WorldHost::new(grid, analytics));
    let directory = Arc::new(PlayerDirectory::new());
    let state_client = Arc::new(PlayerStateClient::new(config.state_api_url.clone()));

    // Start the world tick background task
    let world_loop = game_loop::start(host.clone());

    let app = routes::router(AppState {
        host,
        directory,
        state_client,
    });

    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server ready on http://{}", addr);

    // Shutdown signal handler
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    // Run server with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!("Server error: {}", e);
    }

    world_loop.abort();
    info!("Server stopped");

    Ok(())
}
