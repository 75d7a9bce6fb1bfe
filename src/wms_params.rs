//! WMS query-parameter derivation for display layers.
//!
//! `build_layer_params` is referentially transparent: no state, no network,
//! identical inputs always produce identical outputs, so callers may invoke
//! it on every prop change.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::{Result, StratusError};
use crate::layer::{LayerRole, LayerSpec, ScaleMode, ValueRange};

/// WMS protocol version requested for all layers.
pub const WMS_VERSION: &str = "1.1.1";

/// Spatial reference for all layers.
pub const WMS_SRS: &str = "EPSG:4326";

/// Fixed color-band count.
pub const NUM_COLOR_BANDS: u32 = 254;

/// Query parameters for one rendered layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolParams {
    /// Composite layer name (`dataset/variable`)
    pub layers: String,
    pub styles: String,
    pub format: String,
    pub transparent: bool,
    /// Suppress horizontal wrap-around of the rendered layer
    pub no_wrap: bool,
    /// Selected absolute timestamp, ISO 8601
    pub time: String,
    pub version: String,
    pub srs: String,
    pub num_color_bands: u32,
    pub scale: ScaleMode,
    /// `min,max` pair; present only for log scale with a known range
    pub color_scale_range: Option<String>,
    pub above_max_color: Option<String>,
    pub below_min_color: Option<String>,
    /// Isoline layers only
    pub num_contours: Option<u32>,
}

/// Clamp a range for logarithmic display.
///
/// Non-positive values have no real logarithm, so the lower bound is floored
/// at the smallest representable positive value and the upper bound strictly
/// above it. Idempotent: clipping a clipped range changes nothing.
pub fn clip_range_for_log(range: ValueRange) -> ValueRange {
    ValueRange {
        min: range.min.max(f64::MIN_POSITIVE),
        max: range.max.max(2.0 * f64::MIN_POSITIVE),
    }
}

/// Format one bound of the scale-range parameter.
///
/// Tiny clipped floors must use scientific notation; plain decimal notation
/// would expand the f64 minimum to hundreds of digits.
fn fmt_scale_value(value: f64) -> String {
    if value != 0.0 && value.abs() < 1e-6 {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

/// Derive the protocol parameters for one layer.
///
/// Fails with `LayerNotReady` while the dataset or timestamp has not
/// resolved; the caller renders a loading state instead.
pub fn build_layer_params(role: LayerRole, spec: &LayerSpec) -> Result<ProtocolParams> {
    let layers = spec.layer_name().ok_or_else(|| StratusError::LayerNotReady {
        message: format!("Dataset not resolved for {} layer", role),
    })?;
    let time = spec.wms_time.ok_or_else(|| StratusError::LayerNotReady {
        message: format!("No time selected for {} layer", role),
    })?;

    let styles = match role {
        LayerRole::Raster => format!("boxfill/{}", spec.palette),
        LayerRole::Isoline => format!("contours/{}", spec.palette),
    };

    let (color_scale_range, above_max_color, below_min_color) = match (spec.scale, spec.range) {
        (ScaleMode::Log, Some(range)) => {
            let clipped = clip_range_for_log(range);
            (
                Some(format!(
                    "{},{}",
                    fmt_scale_value(clipped.min),
                    fmt_scale_value(clipped.max)
                )),
                Some("transparent".to_string()),
                Some("transparent".to_string()),
            )
        }
        // Linear scale or unresolved range: the renderer uses its own
        // default stretch.
        _ => (None, None, None),
    };

    Ok(ProtocolParams {
        layers,
        styles,
        format: "image/png".to_string(),
        transparent: true,
        no_wrap: true,
        time: time.to_rfc3339_opts(SecondsFormat::Secs, true),
        version: WMS_VERSION.to_string(),
        srs: WMS_SRS.to_string(),
        num_color_bands: NUM_COLOR_BANDS,
        scale: spec.scale,
        color_scale_range,
        above_max_color,
        below_min_color,
        num_contours: match role {
            LayerRole::Isoline => spec.num_contours,
            LayerRole::Raster => None,
        },
    })
}

impl ProtocolParams {
    /// Flatten to WMS key-value pairs.
    ///
    /// This is the only place the scale mode takes its `"true"`/`"false"`
    /// wire form.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("layers", self.layers.clone()),
            ("styles", self.styles.clone()),
            ("format", self.format.clone()),
            ("transparent", self.transparent.to_string()),
            ("nowrap", self.no_wrap.to_string()),
            ("time", self.time.clone()),
            ("version", self.version.clone()),
            ("srs", self.srs.clone()),
            ("numcolorbands", self.num_color_bands.to_string()),
            ("logscale", self.scale.wms_logscale_value().to_string()),
        ];
        if let Some(range) = &self.color_scale_range {
            pairs.push(("colorscalerange", range.clone()));
        }
        if let Some(color) = &self.above_max_color {
            pairs.push(("abovemaxcolor", color.clone()));
        }
        if let Some(color) = &self.below_min_color {
            pairs.push(("belowmincolor", color.clone()));
        }
        if let Some(n) = self.num_contours {
            pairs.push(("numcontours", n.to_string()));
        }
        pairs
    }
}
