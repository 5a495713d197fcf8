//! Alertrix API Server
//!
//! HTTP surface for webhook ingestion, strategy management and the
//! dashboard. Stateless apart from its store connections; evaluation runs
//! in the separate worker process.

use alertrix::core::http::start_server;
use alertrix::logging;
use dotenvy::dotenv;
use std::env;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let env = alertrix::config::get_environment();
    info!("Starting Alertrix API Server");
    info!(environment = %env, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    info!("Note: evaluation runs in the worker process. Use 'cargo run --bin worker' to start it.");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
