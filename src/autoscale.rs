//! Server-assisted color-range determination for rendered layers.
//!
//! Autoscale runs off the renderer's load-complete signal, never eagerly:
//! a view extent is only meaningful once a viewport exists. Responses racing
//! user edits are handled by the `(layer name, timestamp)` token captured at
//! request time - a response whose token no longer matches the layer is
//! discarded without mutating state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layer::{LayerSpec, ValueRange};
use crate::services::{MapImageryService, MinMaxQuery};

/// Current visible geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewExtent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl ViewExtent {
    /// Zero-width extents are a known artifact of longitude-normalized
    /// source rasters near the antimeridian; the backend rejects them.
    pub fn is_degenerate(&self) -> bool {
        self.west == self.east
    }

    /// Bounding box in `west,south,east,north` form.
    pub fn bbox_string(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// Substitute the configured fallback box for degenerate extents.
pub fn effective_extent(extent: ViewExtent, fallback: ViewExtent) -> ViewExtent {
    if extent.is_degenerate() {
        debug!(
            west = extent.west,
            east = extent.east,
            "Degenerate view extent, substituting fallback box"
        );
        fallback
    } else {
        extent
    }
}

/// Identity of an in-flight range request.
///
/// Palette and scale changes do not invalidate the request - the min/max of
/// the visible data depends only on which slice is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleToken {
    pub layer_name: String,
    pub time: DateTime<Utc>,
}

impl ScaleToken {
    /// Capture the token for a layer, if it is renderable at all.
    pub fn capture(spec: &LayerSpec) -> Option<Self> {
        Some(Self {
            layer_name: spec.layer_name()?,
            time: spec.wms_time?,
        })
    }

    /// Whether the layer still renders the same (name, timestamp) pair.
    pub fn still_current(&self, spec: &LayerSpec) -> bool {
        spec.layer_name().as_deref() == Some(self.layer_name.as_str())
            && spec.wms_time == Some(self.time)
    }
}

/// Fetch the server-computed min/max for a layer over the (possibly
/// corrected) extent.
///
/// Upstream failure is reported as None: autoscale is a best-effort
/// enhancement and the layer keeps its previous or default stretch.
pub async fn fetch_range(
    imagery: &dyn MapImageryService,
    token: &ScaleToken,
    extent: ViewExtent,
    fallback: ViewExtent,
) -> Option<ValueRange> {
    let extent = effective_extent(extent, fallback);
    let query = MinMaxQuery {
        layer_name: token.layer_name.clone(),
        bbox: extent.bbox_string(),
        time: token.time,
    };

    match imagery.min_max(&query).await {
        Ok(range) => {
            debug!(
                layer = %token.layer_name,
                min = range.min,
                max = range.max,
                "Autoscale range resolved"
            );
            Some(range)
        }
        Err(e) => {
            warn!(
                layer = %token.layer_name,
                error = %e,
                "Autoscale fetch failed, keeping previous range"
            );
            None
        }
    }
}
