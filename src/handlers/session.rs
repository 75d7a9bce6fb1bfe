//! Session endpoints: creation and retrieval.
//!
//! A session holds one raster layer and optionally one isoline comparand.
//! Creation resolves the time metadata of both layers concurrently; a layer
//! whose instance matches no files comes back in the disabled/loading state
//! rather than failing the whole request.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::{error_response, parse_role, parse_session_id};
use crate::error::Result;
use crate::layer::{apply_layer_event, LayerEvent, LayerSpec};
use crate::logging::{generate_request_id, log_session_created};
use crate::state::{AppState, LayerSession};
use crate::time_index::{resolve_time_map, DatasetInstance, FileRecord};

/// Default palette for both layer roles
const DEFAULT_PALETTE: &str = "x-Occam";

/// Default isoline contour count
const DEFAULT_NUM_CONTOURS: u32 = 10;

/// One layer's dataset selection.
#[derive(Debug, Deserialize)]
pub struct LayerSelection {
    /// Run + climatological period being selected
    pub instance: DatasetInstance,
    pub variable_id: String,
    /// Identifier the imagery service knows the instance by
    pub dataset: String,
    /// Catalog records to resolve times from
    pub candidate_files: Vec<FileRecord>,
    pub palette: Option<String>,
    /// Isoline layers only
    pub num_contours: Option<u32>,
}

/// Body of POST /sessions
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub raster: LayerSelection,
    pub isoline: Option<LayerSelection>,
}

/// Session state as returned to the UI.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub raster: LayerSpec,
    pub isoline: Option<LayerSpec>,
    pub linked: bool,
    /// Whether the two layers' time selections are compatible for linking
    pub times_linkable: bool,
}

impl SessionView {
    pub fn from_session(session: &LayerSession) -> Self {
        Self {
            id: session.id,
            raster: session.raster.clone(),
            isoline: session.isoline.clone(),
            linked: session.linked,
            times_linkable: session.times_linkable(),
        }
    }
}

/// Resolve one selection into a layer spec.
async fn build_layer(state: &AppState, selection: &LayerSelection, isoline: bool) -> Result<LayerSpec> {
    let resolved = resolve_time_map(
        state.metadata.as_ref(),
        &selection.instance,
        &selection.variable_id,
        &selection.candidate_files,
    )
    .await;

    let palette = selection
        .palette
        .clone()
        .unwrap_or_else(|| DEFAULT_PALETTE.to_string());
    let mut spec = LayerSpec::new(&selection.variable_id, palette);
    if isoline {
        spec.num_contours = Some(selection.num_contours.unwrap_or(DEFAULT_NUM_CONTOURS));
    }

    apply_layer_event(
        &mut spec,
        LayerEvent::DatasetChanged {
            dataset: selection.dataset.clone(),
            variable_id: selection.variable_id.clone(),
            times: resolved.time_map,
            default_key: resolved.default_key,
        },
    )?;

    Ok(spec)
}

/// Handle POST /sessions requests
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/sessions",
        request_id = %request_id,
        raster_variable = %request.raster.variable_id,
        isoline_variable = ?request.isoline.as_ref().map(|i| &i.variable_id),
        "Processing session creation"
    );

    let result: Result<SessionView> = async {
        let (raster, isoline) = match &request.isoline {
            Some(isoline_selection) => {
                let (raster, isoline) = tokio::join!(
                    build_layer(&state, &request.raster, false),
                    build_layer(&state, isoline_selection, true)
                );
                (raster?, Some(isoline?))
            }
            None => (build_layer(&state, &request.raster, false).await?, None),
        };

        let session = LayerSession::new(raster, isoline);
        let view = SessionView::from_session(&session);

        log_session_created(
            &session.id.to_string(),
            &session.raster.variable_id,
            session.raster.times.as_ref().map_or(0, |m| m.len()),
            session.isoline.as_ref().map(|i| i.variable_id.as_str()),
            session
                .isoline
                .as_ref()
                .and_then(|i| i.times.as_ref())
                .map_or(0, |m| m.len()),
        );

        state.sessions.insert(session);
        Ok(view)
    }
    .await;

    match result {
        Ok(view) => {
            let duration = start_time.elapsed();
            info!(
                endpoint = "/sessions",
                request_id = %request_id,
                session_id = %view.id,
                duration_ms = duration.as_millis() as u64,
                "Session created"
            );
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(error) => error_response(error, "/sessions", &request_id),
    }
}

/// Handle POST /sessions/:id/layers/:role/dataset requests
///
/// Replaces one layer's dataset instance: times are re-resolved from the new
/// candidate files and the layer's time selection and range reset, while
/// palette, scale, and contour settings persist.
pub async fn select_dataset_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, role)): Path<(String, String)>,
    Json(selection): Json<LayerSelection>,
) -> Response {
    let request_id = generate_request_id();

    debug!(
        endpoint = "/sessions/:id/layers/:role/dataset",
        request_id = %request_id,
        session_id = %session_id,
        variable = %selection.variable_id,
        "Switching dataset instance"
    );

    let result: Result<SessionView> = async {
        let id = parse_session_id(&session_id)?;
        let role = parse_role(&role)?;

        let resolved = resolve_time_map(
            state.metadata.as_ref(),
            &selection.instance,
            &selection.variable_id,
            &selection.candidate_files,
        )
        .await;

        state.sessions.update(&id, |session| {
            session.apply_event(
                role,
                LayerEvent::DatasetChanged {
                    dataset: selection.dataset,
                    variable_id: selection.variable_id,
                    times: resolved.time_map,
                    default_key: resolved.default_key,
                },
            )?;
            Ok(SessionView::from_session(session))
        })
    }
    .await;

    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => error_response(error, "/sessions/:id/layers/:role/dataset", &request_id),
    }
}

/// Handle GET /sessions/:id requests
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    let request_id = generate_request_id();

    let result: Result<SessionView> = (|| {
        let id = parse_session_id(&session_id)?;
        let session = state.sessions.get(&id)?;
        Ok(SessionView::from_session(&session))
    })();

    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => error_response(error, "/sessions/:id", &request_id),
    }
}
