//! State-transition endpoints.
//!
//! Every user-driven change (time, palette, scale, contours, dataset) and
//! the link toggle arrive here as discrete events, applied through the
//! session store's serialized update path.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{error_response, parse_session_id};
use crate::error::Result;
use crate::handlers::session::SessionView;
use crate::layer::{LayerEvent, LayerRole};
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Body of POST /sessions/:id/events
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub role: LayerRole,
    #[serde(flatten)]
    pub event: LayerEvent,
}

/// Body of POST /sessions/:id/link
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub linked: bool,
}

/// Handle POST /sessions/:id/events requests
pub async fn event_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<EventRequest>,
) -> Response {
    let request_id = generate_request_id();

    debug!(
        endpoint = "/sessions/:id/events",
        request_id = %request_id,
        session_id = %session_id,
        role = %request.role,
        event = ?request.event,
        "Applying layer event"
    );

    let result: Result<SessionView> = (|| {
        let id = parse_session_id(&session_id)?;
        state.sessions.update(&id, |session| {
            session.apply_event(request.role, request.event.clone())?;
            Ok(SessionView::from_session(session))
        })
    })();

    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => error_response(error, "/sessions/:id/events", &request_id),
    }
}

/// Handle POST /sessions/:id/link requests
pub async fn link_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<LinkRequest>,
) -> Response {
    let request_id = generate_request_id();

    debug!(
        endpoint = "/sessions/:id/link",
        request_id = %request_id,
        session_id = %session_id,
        linked = request.linked,
        "Toggling time link"
    );

    let result: Result<SessionView> = (|| {
        let id = parse_session_id(&session_id)?;
        state.sessions.update(&id, |session| {
            session.set_linked(request.linked)?;
            Ok(SessionView::from_session(session))
        })
    })();

    match result {
        Ok(view) => Json(view).into_response(),
        Err(error) => error_response(error, "/sessions/:id/link", &request_id),
    }
}
