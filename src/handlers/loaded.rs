//! Render-complete endpoint: the autoscale trigger.
//!
//! The renderer (browser map) reports that tiles for the current parameters
//! finished loading, together with the visible extent. Only then is an
//! autoscale query meaningful. The response says whether a range was applied;
//! a stale or failed fetch still answers 200 with `applied: false`, because
//! autoscale is best-effort.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{error_response, parse_role, parse_session_id};
use crate::autoscale::{fetch_range, ScaleToken, ViewExtent};
use crate::error::{Result, StratusError};
use crate::layer::{apply_layer_event, LayerEvent, ScalePhase, ValueRange};
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Body of POST /sessions/:id/layers/:role/loaded
#[derive(Debug, Deserialize)]
pub struct LoadedRequest {
    /// Current visible bounding box of the map viewport
    pub extent: ViewExtent,
}

/// Response of POST /sessions/:id/layers/:role/loaded
#[derive(Debug, Serialize)]
pub struct LoadedResponse {
    /// Whether a fresh range was applied to the layer
    pub applied: bool,
    pub range: Option<ValueRange>,
    pub phase: ScalePhase,
}

/// Handle POST /sessions/:id/layers/:role/loaded requests
pub async fn loaded_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, role)): Path<(String, String)>,
    Json(request): Json<LoadedRequest>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    let endpoint = "/sessions/:id/layers/:role/loaded";

    // Record the render-complete transition and capture the staleness token
    // under the same lock, so the token matches what was just rendered.
    let setup: Result<(uuid::Uuid, crate::layer::LayerRole, ScaleToken)> = (|| {
        let id = parse_session_id(&session_id)?;
        let role = parse_role(&role)?;
        let token = state.sessions.update(&id, |session| {
            let spec = session.layer_mut(role)?;
            apply_layer_event(spec, LayerEvent::RenderCompleted)?;
            ScaleToken::capture(spec).ok_or_else(|| StratusError::LayerNotReady {
                message: format!("{} layer has no renderable state", role),
            })
        })?;
        Ok((id, role, token))
    })();

    let (id, role, token) = match setup {
        Ok(setup) => setup,
        Err(error) => return error_response(error, endpoint, &request_id),
    };

    debug!(
        endpoint = endpoint,
        request_id = %request_id,
        layer = %token.layer_name,
        "Layer loaded, requesting autoscale range"
    );

    let fetched = fetch_range(
        state.imagery.as_ref(),
        &token,
        request.extent,
        state.config.autoscale.fallback_extent,
    )
    .await;

    let result: Result<LoadedResponse> = state.sessions.update(&id, |session| {
        let spec = session.layer_mut(role)?;
        match fetched {
            // Commit only while the layer still renders the same
            // (name, timestamp) pair the request was issued for.
            Some(range) if token.still_current(spec) => {
                apply_layer_event(spec, LayerEvent::RangeResolved { range })?;
                Ok(LoadedResponse {
                    applied: true,
                    range: Some(range),
                    phase: spec.phase,
                })
            }
            Some(_) => {
                debug!(
                    request_id = %request_id,
                    layer = %token.layer_name,
                    "Discarding stale autoscale response"
                );
                Ok(LoadedResponse {
                    applied: false,
                    range: None,
                    phase: spec.phase,
                })
            }
            None => Ok(LoadedResponse {
                applied: false,
                range: None,
                phase: spec.phase,
            }),
        }
    });

    match result {
        Ok(response) => {
            let duration = start_time.elapsed();
            info!(
                endpoint = endpoint,
                request_id = %request_id,
                layer = %token.layer_name,
                applied = response.applied,
                duration_ms = duration.as_millis() as u64,
                "Autoscale round-trip finished"
            );
            Json(response).into_response()
        }
        Err(error) => error_response(error, endpoint, &request_id),
    }
}
