//! Colorbar legend computation for rendered layers.
//!
//! The legend is a vertical gradient image (served by the imagery service)
//! plus three value labels. Labels follow the layer's range and scale mode;
//! while the range is unresolved the descriptor is a placeholder with no
//! labels rather than stale numbers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::ColorbarConfig;
use crate::layer::{LayerSpec, ScaleMode, ValueRange};
use crate::services::MapImageryService;
use crate::wms_params::NUM_COLOR_BANDS;

/// Legend descriptor: gradient resource plus the three scale labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendDescriptor {
    pub gradient_url: String,
    pub max_label: Option<String>,
    pub mid_label: Option<String>,
    pub min_label: Option<String>,
}

/// Scale midpoint of a display range.
///
/// Linear scales take the arithmetic mean. Log scales take the geometric
/// center - perceptual color spacing under log compression is
/// multiplicative - with the lower bound floored at the smallest positive
/// value, since non-positive values have no logarithm.
pub fn midpoint(range: ValueRange, scale: ScaleMode) -> f64 {
    match scale {
        ScaleMode::Linear => (range.min + range.max) / 2.0,
        ScaleMode::Log => {
            let clipped_min = range.min.max(f64::MIN_POSITIVE);
            ((range.max.ln() - clipped_min.ln()) / 2.0 + clipped_min.ln()).exp()
        }
    }
}

/// Renders legend descriptors for live layers.
///
/// The gradient URL is memoized per (palette, band count) and only rebuilt
/// when either changes.
pub struct ColorbarRenderer {
    imagery: Arc<dyn MapImageryService>,
    config: ColorbarConfig,
    legend_memo: Mutex<Option<((String, u32), String)>>,
}

impl ColorbarRenderer {
    pub fn new(imagery: Arc<dyn MapImageryService>, config: ColorbarConfig) -> Self {
        Self {
            imagery,
            config,
            legend_memo: Mutex::new(None),
        }
    }

    /// Decimal precision for a variable's labels.
    fn precision_for(&self, variable_id: &str) -> usize {
        self.config
            .precision
            .get(variable_id)
            .copied()
            .unwrap_or(self.config.default_precision)
    }

    fn gradient_url(&self, palette: &str) -> String {
        let key = (palette.to_string(), NUM_COLOR_BANDS);
        let mut memo = self.legend_memo.lock();
        if let Some((cached_key, url)) = memo.as_ref() {
            if *cached_key == key {
                return url.clone();
            }
        }
        let url = self.imagery.legend_graphic_url(palette, NUM_COLOR_BANDS);
        *memo = Some((key, url.clone()));
        url
    }

    /// Build the legend descriptor for a layer.
    pub fn render(&self, spec: &LayerSpec) -> LegendDescriptor {
        let gradient_url = self.gradient_url(&spec.palette);

        let Some(range) = spec.range else {
            return LegendDescriptor {
                gradient_url,
                max_label: None,
                mid_label: None,
                min_label: None,
            };
        };

        let precision = self.precision_for(&spec.variable_id);
        let mid = midpoint(range, spec.scale);

        LegendDescriptor {
            gradient_url,
            max_label: Some(format!("{:.*}", precision, range.max)),
            mid_label: Some(format!("{:.*}", precision, mid)),
            min_label: Some(format!("{:.*}", precision, range.min)),
        }
    }
}
