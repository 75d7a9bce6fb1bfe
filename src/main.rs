//! stratus - a layer-state synchronization service for climate map exploration
//!
//! This is the main entry point for the stratus application.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

use stratus::handlers::{
    colorbar_handler, create_session_handler, event_handler, get_session_handler,
    heartbeat_handler, link_handler, loaded_handler, params_handler, select_dataset_handler,
};
use stratus::services::{HttpMapImageryService, HttpTimeMetadataService};
use stratus::{AppState, Config, Result, StratusError};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    // Validate configuration
    config.validate().map_err(|e| {
        eprintln!("Invalid configuration: {}", e);
        e
    })?;

    // Initialize tracing with the configured level
    stratus::init_tracing(&config.log_level);

    info!("Starting stratus v{}", env!("CARGO_PKG_VERSION"));
    info!("Metadata service: {}", config.services.metadata_url);
    info!("Imagery service: {}", config.services.imagery_url);

    // Build the upstream clients and shared state
    let metadata = Arc::new(HttpTimeMetadataService::new(
        config.services.metadata_url.clone(),
    ));
    let imagery = Arc::new(HttpMapImageryService::new(
        config.services.imagery_url.clone(),
    ));
    let state = AppState::new_shared(config.clone(), metadata, imagery);

    // Build the router
    let app = Router::new()
        .route("/heartbeat", get(heartbeat_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/:id", get(get_session_handler))
        .route("/sessions/:id/events", post(event_handler))
        .route("/sessions/:id/link", post(link_handler))
        .route(
            "/sessions/:id/layers/:role/dataset",
            post(select_dataset_handler),
        )
        .route("/sessions/:id/layers/:role/params", get(params_handler))
        .route("/sessions/:id/layers/:role/loaded", post(loaded_handler))
        .route("/sessions/:id/layers/:role/colorbar", get(colorbar_handler))
        .layer(stratus::create_http_trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Create the server address
    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| StratusError::Config {
                message: format!("Invalid host address: {}", e),
            })?,
        config.server.port,
    ));

    info!("Server listening on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StratusError::Server {
            message: format!("Failed to bind to address: {}", e),
        })?;

    // Set up graceful shutdown
    let shutdown_future = shutdown_signal();

    info!("Server is ready to accept connections");

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_future)
        .await
        .map_err(|e| StratusError::Server {
            message: format!("Server error: {}", e),
        })?;

    info!("Server has been gracefully shut down");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
