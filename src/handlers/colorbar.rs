//! Colorbar legend endpoint.
//!
//! Returns the legend descriptor (gradient URL plus max/mid/min labels) for
//! one layer. A layer whose range has not resolved yet answers with the
//! placeholder descriptor: gradient only, no labels.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use super::{error_response, parse_role, parse_session_id};
use crate::colorbar::LegendDescriptor;
use crate::error::Result;
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Handle GET /sessions/:id/layers/:role/colorbar requests
pub async fn colorbar_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, role)): Path<(String, String)>,
) -> Response {
    let request_id = generate_request_id();

    let result: Result<LegendDescriptor> = (|| {
        let id = parse_session_id(&session_id)?;
        let role = parse_role(&role)?;
        let session = state.sessions.get(&id)?;
        Ok(state.colorbar.render(session.layer(role)?))
    })();

    match result {
        Ok(legend) => Json(legend).into_response(),
        Err(error) => error_response(error, "/sessions/:id/layers/:role/colorbar", &request_id),
    }
}
