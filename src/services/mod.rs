//! Upstream service clients.
//!
//! The engine consumes two collaborators over HTTP: the metadata service
//! (per-file time lists) and the WMS-like map imagery service (min/max
//! metadata queries and legend graphics). Both sit behind traits so tests
//! can substitute in-process fakes.

pub mod metadata;
pub mod wms;

pub use metadata::{HttpTimeMetadataService, TimeMetadataService};
pub use wms::{HttpMapImageryService, MapImageryService, MinMaxQuery};
