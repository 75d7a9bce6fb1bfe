//! In-process fake upstream services.
//!
//! One axum server plays both collaborators: the metadata service (per-file
//! time lists under `/api/times/:id`) and the WMS imagery service (min/max
//! metadata queries under `/wms`). Test code steers responses and inspects
//! received queries through the shared `UpstreamState`.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;

/// Controllable state of the fake services.
#[derive(Default)]
pub struct UpstreamState {
    /// Per-file time lists served by the metadata route
    pub files: Mutex<HashMap<String, BTreeMap<u32, String>>>,
    /// Min/max answered by the imagery route; None simulates a failure
    pub minmax: Mutex<Option<(f64, f64)>>,
    /// Delay applied before every min/max response, in milliseconds
    pub minmax_delay_ms: AtomicU64,
    /// Bounding boxes of every min/max query received
    pub minmax_bboxes: Mutex<Vec<String>>,
}

/// Handle to the running fake services.
pub struct Upstream {
    pub addr: SocketAddr,
    pub state: Arc<UpstreamState>,
}

impl Upstream {
    pub fn metadata_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn imagery_url(&self) -> String {
        format!("http://{}/wms", self.addr)
    }

    /// Register the time list of one file.
    pub fn add_file(&self, unique_id: &str, times: BTreeMap<u32, String>) {
        self.state.files.lock().insert(unique_id.to_string(), times);
    }

    pub fn set_minmax(&self, min: f64, max: f64) {
        *self.state.minmax.lock() = Some((min, max));
    }

    pub fn fail_minmax(&self) {
        *self.state.minmax.lock() = None;
    }

    pub fn set_minmax_delay_ms(&self, delay: u64) {
        self.state.minmax_delay_ms.store(delay, Ordering::SeqCst);
    }

    pub fn minmax_bboxes(&self) -> Vec<String> {
        self.state.minmax_bboxes.lock().clone()
    }
}

async fn times_handler(
    State(state): State<Arc<UpstreamState>>,
    Path(unique_id): Path<String>,
) -> Response {
    match state.files.lock().get(&unique_id) {
        Some(times) => Json(serde_json::json!({ "times": times })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no such file: {}", unique_id) })),
        )
            .into_response(),
    }
}

async fn wms_handler(
    State(state): State<Arc<UpstreamState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("request").map(String::as_str) != Some("GetMetadata") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "unsupported request" })),
        )
            .into_response();
    }

    if let Some(bbox) = params.get("bbox") {
        state.minmax_bboxes.lock().push(bbox.clone());
    }

    let delay = state.minmax_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    let minmax = *state.minmax.lock();
    match minmax {
        Some((min, max)) => Json(serde_json::json!({ "min": min, "max": max })).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "minmax unavailable" })),
        )
            .into_response(),
    }
}

/// Start the fake services on an ephemeral port.
pub async fn start() -> Upstream {
    let state = Arc::new(UpstreamState::default());

    let app = Router::new()
        .route("/api/times/:id", get(times_handler))
        .route("/wms", get(wms_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream port");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Upstream error");
    });

    Upstream { addr, state }
}
