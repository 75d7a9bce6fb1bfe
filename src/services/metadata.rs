//! Client for the time-metadata service.
//!
//! The metadata service answers, per data file, the list of
//! (timeidx -> timestamp) entries. The engine issues one fetch per candidate
//! file per dataset-instance selection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StratusError};

/// Per-file time lists.
#[async_trait]
pub trait TimeMetadataService: Send + Sync {
    /// Fetch the (timeidx -> timestamp) entries of one data file.
    async fn file_times(&self, unique_id: &str) -> Result<BTreeMap<u32, DateTime<Utc>>>;
}

/// HTTP implementation backed by the metadata API.
pub struct HttpTimeMetadataService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTimeMetadataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

/// Wire shape of the metadata service's time-list response
#[derive(Debug, Deserialize)]
struct FileTimesResponse {
    times: BTreeMap<u32, DateTime<Utc>>,
}

#[async_trait]
impl TimeMetadataService for HttpTimeMetadataService {
    async fn file_times(&self, unique_id: &str) -> Result<BTreeMap<u32, DateTime<Utc>>> {
        let url = format!("{}/times/{}", self.base_url, unique_id);
        debug!(file = unique_id, url = %url, "Fetching time metadata");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(StratusError::Upstream {
                message: format!(
                    "Metadata service returned {} for file {}",
                    response.status(),
                    unique_id
                ),
            });
        }

        let body: FileTimesResponse = response.json().await?;
        Ok(body.times)
    }
}
