//! Test data builders.
//!
//! Catalog records, time lists, and request bodies shared across the
//! integration tests. All instances use the same run and period so the
//! matching logic is exercised through variables and timescales.

use std::collections::BTreeMap;

/// Time entries for a file: n instants spread over the climatology year.
pub fn iso_times(n: u32) -> BTreeMap<u32, String> {
    (0..n)
        .map(|idx| (idx, format!("1985-{:02}-15T00:00:00Z", idx % 12 + 1)))
        .collect()
}

/// Catalog record for one file of the shared test instance.
pub fn file_record(unique_id: &str, timescale: &str, variables: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "unique_id": unique_id,
        "ensemble_member": "r1i1p1",
        "start_date": "19710101",
        "end_date": "20001231",
        "timescale": timescale,
        "variable_ids": variables,
    })
}

/// Layer selection for a session-creation request.
pub fn layer_selection(
    dataset: &str,
    variable_id: &str,
    candidate_files: Vec<serde_json::Value>,
) -> serde_json::Value {
    serde_json::json!({
        "instance": {
            "ensemble_member": "r1i1p1",
            "start_date": "19710101",
            "end_date": "20001231",
        },
        "variable_id": variable_id,
        "dataset": dataset,
        "candidate_files": candidate_files,
    })
}

/// A raster-only session over three temporal resolutions of one variable.
pub fn raster_only_session() -> serde_json::Value {
    serde_json::json!({
        "raster": layer_selection(
            "tasmax_ds",
            "tasmax",
            vec![
                file_record("tasmax_monthly", "monthly", &["tasmax"]),
                file_record("tasmax_seasonal", "seasonal", &["tasmax"]),
                file_record("tasmax_yearly", "yearly", &["tasmax"]),
            ],
        ),
    })
}

/// A raster + isoline session whose layers share monthly keys.
pub fn dual_monthly_session() -> serde_json::Value {
    serde_json::json!({
        "raster": layer_selection(
            "tasmax_ds",
            "tasmax",
            vec![file_record("tasmax_monthly", "monthly", &["tasmax"])],
        ),
        "isoline": layer_selection(
            "pr_ds",
            "pr",
            vec![file_record("pr_monthly", "monthly", &["pr"])],
        ),
    })
}
