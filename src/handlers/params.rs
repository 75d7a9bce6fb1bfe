//! Protocol-parameter endpoint.
//!
//! Returns the WMS query parameters for one layer of a session. While the
//! layer is still resolving (no dataset or no timestamp yet) the response is
//! a 409 and the UI keeps its loading state.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::{error_response, parse_role, parse_session_id};
use crate::error::Result;
use crate::logging::generate_request_id;
use crate::state::AppState;
use crate::wms_params::{build_layer_params, ProtocolParams};

/// Response of GET /sessions/:id/layers/:role/params
#[derive(Debug, Serialize)]
pub struct ParamsResponse {
    pub params: ProtocolParams,
    /// Flattened WMS key-value pairs, ready for the tile URL
    pub query_pairs: Vec<(String, String)>,
}

/// Handle GET /sessions/:id/layers/:role/params requests
pub async fn params_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, role)): Path<(String, String)>,
) -> Response {
    let request_id = generate_request_id();

    let result: Result<ParamsResponse> = (|| {
        let id = parse_session_id(&session_id)?;
        let role = parse_role(&role)?;
        let session = state.sessions.get(&id)?;
        let params = build_layer_params(role, session.layer(role)?)?;
        let query_pairs = params
            .to_query_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Ok(ParamsResponse {
            params,
            query_pairs,
        })
    })();

    match result {
        Ok(response) => {
            debug!(
                endpoint = "/sessions/:id/layers/:role/params",
                request_id = %request_id,
                layers = %response.params.layers,
                "Layer parameters built"
            );
            Json(response).into_response()
        }
        Err(error) => error_response(error, "/sessions/:id/layers/:role/params", &request_id),
    }
}
