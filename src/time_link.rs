//! Linking the isoline layer's time selection to the raster layer's.
//!
//! Propagation is strictly one-directional (raster to isoline). An invalid
//! link target is prevented structurally: linkage is only offered when every
//! raster key has an isoline counterpart, and a propagation whose key is
//! absent from the isoline map resolves to no-op rather than an error.

use crate::timekey::{TimeKey, TimeMap};

/// Whether the two time selections can be linked at all.
///
/// Linking forces the isoline to the raster's key, so every raster key must
/// exist in the isoline map.
pub fn times_linkable(raster: &TimeMap, isoline: &TimeMap) -> bool {
    !raster.is_empty() && raster.keys().all(|key| isoline.contains_key(key))
}

/// Resolve the isoline target key for a raster time change.
///
/// Returns None when not linked, when the isoline has no time map yet, or
/// when the key has no isoline counterpart.
pub fn link_times(
    linked: bool,
    primary_key: TimeKey,
    secondary_times: Option<&TimeMap>,
) -> Option<TimeKey> {
    if !linked {
        return None;
    }
    secondary_times.and_then(|map| map.contains_key(&primary_key).then_some(primary_key))
}
