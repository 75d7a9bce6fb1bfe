//! Client for the WMS-like map imagery service.
//!
//! Two capabilities are consumed here: the GetMetadata-style min/max query
//! that autoscale relies on, and the legend-graphic resource the colorbar
//! points at. Tile rendering itself goes straight from the browser to the
//! imagery service and never passes through this process.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StratusError};
use crate::layer::ValueRange;
use crate::wms_params::{WMS_SRS, WMS_VERSION};

/// Min/max metadata query for one rendered layer over a view extent.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxQuery {
    /// Composite layer name (`dataset/variable`)
    pub layer_name: String,
    /// Bounding box as `west,south,east,north`
    pub bbox: String,
    /// Timestamp of the rendered slice
    pub time: DateTime<Utc>,
}

#[async_trait]
pub trait MapImageryService: Send + Sync {
    /// Server-computed min/max of the layer's data over the given extent.
    async fn min_max(&self, query: &MinMaxQuery) -> Result<ValueRange>;

    /// URL of the legend-graphic resource for a palette and band count.
    fn legend_graphic_url(&self, palette: &str, num_color_bands: u32) -> String;
}

/// HTTP implementation backed by the WMS endpoint.
pub struct HttpMapImageryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMapImageryService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MinMaxResponse {
    min: f64,
    max: f64,
}

#[async_trait]
impl MapImageryService for HttpMapImageryService {
    async fn min_max(&self, query: &MinMaxQuery) -> Result<ValueRange> {
        debug!(
            layer = %query.layer_name,
            bbox = %query.bbox,
            "Fetching min/max metadata"
        );

        let time = query.time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("request", "GetMetadata"),
                ("item", "minmax"),
                ("layers", query.layer_name.as_str()),
                ("styles", "default"),
                ("version", WMS_VERSION),
                ("bbox", query.bbox.as_str()),
                ("srs", WMS_SRS),
                ("width", "100"),
                ("height", "100"),
                ("time", time.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StratusError::Upstream {
                message: format!(
                    "Imagery service returned {} for min/max of {}",
                    response.status(),
                    query.layer_name
                ),
            });
        }

        let body: MinMaxResponse = response.json().await?;
        Ok(ValueRange {
            min: body.min,
            max: body.max,
        })
    }

    fn legend_graphic_url(&self, palette: &str, num_color_bands: u32) -> String {
        format!(
            "{}?request=GetLegendGraphic&palette={}&numcolorbands={}&colorbaronly=true",
            self.base_url, palette, num_color_bands
        )
    }
}
