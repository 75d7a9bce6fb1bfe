//! Common test utilities for stratus.
//!
//! This module provides shared utilities for testing the stratus server:
//! HTTP client helpers, in-process fake upstream services, and test-data
//! builders.

// Re-export all common test utilities
pub mod http_client;
pub mod test_data;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use stratus::handlers::{
    colorbar_handler, create_session_handler, event_handler, get_session_handler,
    heartbeat_handler, link_handler, loaded_handler, params_handler, select_dataset_handler,
};
use stratus::services::{HttpMapImageryService, HttpTimeMetadataService};
use stratus::{AppState, Config};

/// Start a stratus server wired to the given fake upstream, on an ephemeral
/// port. The server task lives as long as the test's runtime.
pub async fn spawn_engine(upstream: &upstream::Upstream) -> SocketAddr {
    let mut config = Config::default();
    config.services.metadata_url = upstream.metadata_url();
    config.services.imagery_url = upstream.imagery_url();
    config.validate().expect("Test config must be valid");

    let metadata = Arc::new(HttpTimeMetadataService::new(
        config.services.metadata_url.clone(),
    ));
    let imagery = Arc::new(HttpMapImageryService::new(
        config.services.imagery_url.clone(),
    ));
    let state = AppState::new_shared(config, metadata, imagery);

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
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test port");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    addr
}
