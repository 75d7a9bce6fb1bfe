//! Time-index resolution across files of differing temporal resolution.
//!
//! A dataset instance may be realized by up to three files (monthly,
//! seasonal, yearly) covering the same variable. This module merges their
//! fetched time lists into one `TimeMap` and picks the starting selection.
//! The merge itself is a pure reducer over already-fetched records; the
//! async entry point only adds the concurrent per-file fetches.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::TimeMetadataService;
use crate::timekey::{TimeKey, TimeMap, Timescale};

/// Identity of one dataset instance: a model run plus climatological period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInstance {
    pub ensemble_member: String,
    pub start_date: String,
    pub end_date: String,
}

/// Catalog record for one underlying data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub unique_id: String,
    pub ensemble_member: String,
    pub start_date: String,
    pub end_date: String,
    pub timescale: Timescale,
    /// Variables the file actually contains
    pub variable_ids: Vec<String>,
}

impl FileRecord {
    /// Whether this file realizes the given instance for the given variable.
    ///
    /// The variable check matters: files of different variables can share a
    /// naming convention, and a record must not be miscategorized just
    /// because its instance fields line up.
    pub fn matches(&self, instance: &DatasetInstance, variable_id: &str) -> bool {
        self.ensemble_member == instance.ensemble_member
            && self.start_date == instance.start_date
            && self.end_date == instance.end_date
            && self.variable_ids.iter().any(|v| v == variable_id)
    }
}

/// Time entries fetched for a single file, tagged with its resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTimes {
    pub timescale: Timescale,
    pub entries: BTreeMap<u32, DateTime<Utc>>,
}

/// Outcome of resolving the available times of one instance/variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedTimes {
    pub time_map: TimeMap,
    /// Starting selection; None when the map is empty
    pub default_key: Option<TimeKey>,
}

/// Merge fetched per-file time lists into a single TimeMap.
pub fn merge_file_times(fetched: &[FileTimes]) -> TimeMap {
    let mut map = TimeMap::new();
    for file in fetched {
        for (&idx, &stamp) in &file.entries {
            match TimeKey::new(file.timescale, idx) {
                Ok(key) => {
                    map.insert(key, stamp);
                }
                Err(_) => {
                    warn!(
                        timescale = %file.timescale,
                        timeidx = idx,
                        "Skipping out-of-range time index"
                    );
                }
            }
        }
    }
    map
}

/// Starting selection: the `timeidx == 0` key, preferring the lowest
/// temporal resolution present.
pub fn default_time_key(map: &TimeMap) -> Option<TimeKey> {
    map.keys()
        .filter(|k| k.timeidx == 0)
        .max_by_key(|k| k.timescale)
        .copied()
}

/// Resolve the TimeMap for one instance/variable.
///
/// Issues one metadata fetch per matching candidate file, concurrently, and
/// merges whatever succeeds. No matching files or all-failed fetches yield
/// an empty map (the consuming selector renders disabled), never an error.
pub async fn resolve_time_map(
    service: &dyn TimeMetadataService,
    instance: &DatasetInstance,
    variable_id: &str,
    candidates: &[FileRecord],
) -> ResolvedTimes {
    let matching: Vec<&FileRecord> = candidates
        .iter()
        .filter(|f| f.matches(instance, variable_id))
        .collect();

    if matching.is_empty() {
        debug!(
            variable = variable_id,
            ensemble_member = %instance.ensemble_member,
            "No files match the requested instance"
        );
        return ResolvedTimes::default();
    }

    let fetches = matching.iter().map(|file| async move {
        match service.file_times(&file.unique_id).await {
            Ok(entries) => Some(FileTimes {
                timescale: file.timescale,
                entries,
            }),
            Err(e) => {
                warn!(
                    file = %file.unique_id,
                    error = %e,
                    "Time metadata fetch failed, skipping file"
                );
                None
            }
        }
    });

    let fetched: Vec<FileTimes> = join_all(fetches).await.into_iter().flatten().collect();
    let time_map = merge_file_times(&fetched);
    let default_key = default_time_key(&time_map);

    debug!(
        variable = variable_id,
        files = matching.len(),
        entries = time_map.len(),
        "Resolved time map"
    );

    ResolvedTimes {
        time_map,
        default_key,
    }
}
