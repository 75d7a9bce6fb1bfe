//! HTTP request handlers for the stratus API.
//!
//! This module contains all the endpoint handlers for the web server, plus
//! the shared error-to-response mapping.

pub mod colorbar;
pub mod events;
pub mod heartbeat;
pub mod loaded;
pub mod params;
pub mod session;

pub use colorbar::colorbar_handler;
pub use events::{event_handler, link_handler};
pub use heartbeat::heartbeat_handler;
pub use loaded::loaded_handler;
pub use params::params_handler;
pub use session::{create_session_handler, get_session_handler, select_dataset_handler};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::error::{Result, StratusError};
use crate::layer::LayerRole;
use crate::logging::log_request_error;

/// HTTP status for an error variant.
fn status_for(error: &StratusError) -> StatusCode {
    match error {
        StratusError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        StratusError::LayerNotReady { .. } => StatusCode::CONFLICT,
        StratusError::InvalidParameter { .. }
        | StratusError::InvalidTimeKey { .. }
        | StratusError::Json(_) => StatusCode::BAD_REQUEST,
        StratusError::Upstream { .. } | StratusError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log and convert an error into the JSON error response.
pub(crate) fn error_response(error: StratusError, endpoint: &str, request_id: &str) -> Response {
    log_request_error(&error, endpoint, request_id, None);

    (
        status_for(&error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "request_id": request_id
        })),
    )
        .into_response()
}

/// Parse a session id path segment.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| StratusError::InvalidParameter {
            param: "session_id".to_string(),
            message: format!("Not a valid session id: {}", raw),
        })
}

/// Parse a layer role path segment.
pub(crate) fn parse_role(raw: &str) -> Result<LayerRole> {
    raw.parse::<LayerRole>()
}
