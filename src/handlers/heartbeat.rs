//! Heartbeat endpoint handler.
//!
//! Returns server status information, including uptime, session count, and
//! the configured upstream endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::state::AppState;

/// Static server ID generated at startup
static SERVER_ID: once_cell::sync::Lazy<String> =
    once_cell::sync::Lazy::new(|| Uuid::new_v4().to_string());

/// Server start time
static START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Heartbeat response structure
#[derive(Serialize)]
pub struct HeartbeatResponse {
    /// Server ID (unique per instance)
    pub server_id: String,
    /// Current timestamp (ISO 8601 format)
    pub timestamp: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Number of live sessions
    pub session_count: usize,
    /// Upstream endpoints this instance talks to
    pub upstream: UpstreamInfo,
    /// Server status
    pub status: String,
}

/// Upstream endpoint information
#[derive(Serialize)]
pub struct UpstreamInfo {
    pub metadata_url: String,
    pub imagery_url: String,
}

/// Handle GET /heartbeat requests
pub async fn heartbeat_handler(State(state): State<Arc<AppState>>) -> Json<HeartbeatResponse> {
    let now = SystemTime::now();
    let timestamp = chrono::DateTime::<chrono::Utc>::from(now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let uptime = now
        .duration_since(*START_TIME)
        .unwrap_or(Duration::from_secs(0));

    Json(HeartbeatResponse {
        server_id: SERVER_ID.clone(),
        timestamp,
        uptime_seconds: uptime.as_secs(),
        session_count: state.sessions.len(),
        upstream: UpstreamInfo {
            metadata_url: state.config.services.metadata_url.clone(),
            imagery_url: state.config.services.imagery_url.clone(),
        },
        status: "healthy".to_string(),
    })
}
