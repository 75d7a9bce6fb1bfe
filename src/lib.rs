//! # stratus
//!
//! A layer-state synchronization service for interactive climate map
//! exploration.
//!
//! This library owns the layer state of a thin browser map UI: which dataset
//! instance, instant, palette, scale, and value range each displayed layer
//! uses. The browser renders tiles straight from the WMS imagery service;
//! stratus keeps the state transitions honest.
//!
//! ## Key Features
//!
//! - **Time-index reconciliation**: merges per-file time lists of differing
//!   temporal resolution (monthly/seasonal/yearly) into one selectable set
//! - **WMS parameter derivation**: pure mapping from layer state to map
//!   protocol query parameters, including log-scale clipping
//! - **Autoscale**: server-assisted color-range determination against the
//!   visible extent, with stale responses discarded
//! - **Time-linking**: the isoline layer's instant can track the raster's
//!
//! ## Architecture
//!
//! - **Engine**: layer specs, reducers, and the coordinators above
//! - **API layer**: session-oriented HTTP endpoints for the UI
//! - **Clients**: async upstream access to the metadata and imagery services

pub mod autoscale;
pub mod colorbar;
pub mod config;
pub mod error;
pub mod handlers;
pub mod layer;
pub mod logging;
pub mod services;
pub mod state;
pub mod time_index;
pub mod time_link;
pub mod timekey;
pub mod wms_params;

pub use config::Config;
pub use error::{Result, StratusError};
pub use layer::{LayerEvent, LayerRole, LayerSpec, ScaleMode, ScalePhase, ValueRange};
pub use logging::{create_http_trace_layer, generate_request_id, init_tracing};
pub use state::{AppState, LayerSession, SessionStore};
pub use timekey::{TimeKey, TimeMap, Timescale};
