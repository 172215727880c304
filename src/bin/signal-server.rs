//! Signal Relay Server
//!
//! Accepts TradingView alert webhooks and turns them into Alpaca limit orders.

use dotenvy::dotenv;
use signal_relay::config::{get_environment, Config};
use signal_relay::core::http::start_server;
use signal_relay::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!("Starting Signal Relay Server");
    info!(environment = %get_environment(), "Environment");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    start_server(config, shutdown_signal()).await.map_err(|e| {
        error!(error = %e, "HTTP server error");
        e
    })?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down signal relay, draining in-flight requests...");
}
