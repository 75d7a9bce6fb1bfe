//! Layer specifications and their event-driven state transitions.
//!
//! A `LayerSpec` describes one displayed layer (raster or isoline). It is
//! created when a dataset instance is selected, mutated by discrete events
//! (time change, palette change, range update), and replaced wholesale when
//! the instance selection changes. All mutation goes through the
//! `apply_layer_event` reducer so competing updates serialize cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StratusError};
use crate::timekey::{TimeKey, TimeMap};

/// Role of a displayed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    /// Primary variable, rendered as colored grid cells
    Raster,
    /// Secondary comparand, rendered as contour lines
    Isoline,
}

impl LayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerRole::Raster => "raster",
            LayerRole::Isoline => "isoline",
        }
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerRole {
    type Err = StratusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raster" => Ok(LayerRole::Raster),
            "isoline" => Ok(LayerRole::Isoline),
            _ => Err(StratusError::InvalidParameter {
                param: "role".to_string(),
                message: format!("Unknown layer role: {}. Must be 'raster' or 'isoline'", s),
            }),
        }
    }
}

/// Color-scale mode.
///
/// The WMS wire form (`"true"`/`"false"` strings for the logscale flag)
/// exists only at the protocol-serialization edge; internal logic never
/// carries the string representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Linear,
    Log,
}

impl ScaleMode {
    /// The `"true"`/`"false"` form the WMS protocol expects.
    pub fn wms_logscale_value(&self) -> &'static str {
        match self {
            ScaleMode::Linear => "false",
            ScaleMode::Log => "true",
        }
    }
}

/// Closed numeric display range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Per-layer scaling state machine.
///
/// A parameter change re-arms the machine at `AwaitingRender`; the renderer's
/// load-complete signal moves it to `AwaitingRange` while the min/max query
/// is in flight; an applied range response completes it at `Scaled`. `Idle`
/// is the pre-dataset state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePhase {
    #[default]
    Idle,
    AwaitingRender,
    AwaitingRange,
    Scaled,
}

/// Specification of one displayed layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Dataset identifier; None until time metadata resolves (loading state)
    pub dataset: Option<String>,
    pub variable_id: String,
    /// Available instants; None while resolution is pending
    pub times: Option<TimeMap>,
    /// Currently selected instant
    pub time_key: Option<TimeKey>,
    /// Absolute timestamp of the selected instant
    pub wms_time: Option<DateTime<Utc>>,
    pub palette: String,
    pub scale: ScaleMode,
    /// Display value range; None until autoscale (or a manual range) applies
    pub range: Option<ValueRange>,
    /// Isoline layers only
    pub num_contours: Option<u32>,
    pub phase: ScalePhase,
}

impl LayerSpec {
    /// A fresh spec in the loading state: no dataset, no times, no range.
    pub fn new(variable_id: impl Into<String>, palette: impl Into<String>) -> Self {
        Self {
            dataset: None,
            variable_id: variable_id.into(),
            times: None,
            time_key: None,
            wms_time: None,
            palette: palette.into(),
            scale: ScaleMode::default(),
            range: None,
            num_contours: None,
            phase: ScalePhase::Idle,
        }
    }

    /// Composite protocol layer name, available once the dataset resolved.
    pub fn layer_name(&self) -> Option<String> {
        self.dataset
            .as_ref()
            .map(|d| format!("{}/{}", d, self.variable_id))
    }

    /// Select an instant, deriving the absolute timestamp from the TimeMap.
    fn set_time_key(&mut self, key: TimeKey) -> Result<()> {
        let stamp = self
            .times
            .as_ref()
            .and_then(|m| m.get(&key))
            .copied()
            .ok_or_else(|| StratusError::InvalidParameter {
                param: "time_key".to_string(),
                message: format!(
                    "Time {} is not available for variable {}",
                    key, self.variable_id
                ),
            })?;
        self.time_key = Some(key);
        self.wms_time = Some(stamp);
        Ok(())
    }
}

/// A discrete state transition on a layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerEvent {
    /// Dataset instance selection changed; replaces the time state wholesale.
    DatasetChanged {
        dataset: String,
        variable_id: String,
        times: TimeMap,
        default_key: Option<TimeKey>,
    },
    TimeChanged { time_key: TimeKey },
    PaletteChanged { palette: String },
    ScaleChanged { scale: ScaleMode },
    ContoursChanged { num_contours: u32 },
    /// The renderer finished loading tiles for the current parameters.
    RenderCompleted,
    /// An autoscale response was accepted (staleness is checked upstream).
    RangeResolved { range: ValueRange },
}

/// Apply one event to one layer spec.
///
/// Each arm is a single independent transition; callers serialize competing
/// events through the session store's write lock.
pub fn apply_layer_event(spec: &mut LayerSpec, event: LayerEvent) -> Result<()> {
    match event {
        LayerEvent::DatasetChanged {
            dataset,
            variable_id,
            times,
            default_key,
        } => {
            spec.variable_id = variable_id;
            spec.time_key = None;
            spec.wms_time = None;
            spec.range = None;
            if times.is_empty() {
                // No files matched the instance: disabled/loading state.
                spec.dataset = None;
                spec.times = Some(times);
                spec.phase = ScalePhase::Idle;
            } else {
                spec.dataset = Some(dataset);
                spec.times = Some(times);
                if let Some(key) = default_key {
                    spec.set_time_key(key)?;
                }
                spec.phase = ScalePhase::AwaitingRender;
            }
        }
        LayerEvent::TimeChanged { time_key } => {
            spec.set_time_key(time_key)?;
            spec.range = None;
            spec.phase = ScalePhase::AwaitingRender;
        }
        LayerEvent::PaletteChanged { palette } => {
            spec.palette = palette;
            spec.phase = ScalePhase::AwaitingRender;
        }
        LayerEvent::ScaleChanged { scale } => {
            spec.scale = scale;
            spec.phase = ScalePhase::AwaitingRender;
        }
        LayerEvent::ContoursChanged { num_contours } => {
            spec.num_contours = Some(num_contours);
            spec.phase = ScalePhase::AwaitingRender;
        }
        LayerEvent::RenderCompleted => {
            spec.phase = ScalePhase::AwaitingRange;
        }
        LayerEvent::RangeResolved { range } => {
            spec.range = Some(range);
            spec.phase = ScalePhase::Scaled;
        }
    }
    Ok(())
}
