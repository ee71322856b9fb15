//! Earth Engine REST client.
//!
//! Authentication is delegated to the service: callers pass an OAuth access
//! token (e.g. from `gcloud auth print-access-token`) and it is sent as a
//! bearer token with every request.

use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::engine::{EarthEngine, OutlineStyle, ReduceRequest, TileLayer, Visualization};
use crate::error::{GeeError, Result};
use crate::expression::{expression, outline, Datasets};
use crate::geometry::Geometry;
use crate::index::IndexKind;
use crate::period::DateInterval;
use crate::raster::Raster;

/// Public Earth Engine API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://earthengine.googleapis.com";

/// Configuration for [`RestEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub endpoint: String,
    /// Cloud project the requests are billed to.
    pub project: String,
    pub datasets: Datasets,
    /// Per-request timeout (default 120 s).
    pub request_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: String::new(),
            datasets: Datasets::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Deserialize)]
struct ComputeResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Deserialize)]
struct MapResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// [`EarthEngine`] over the v1 REST API.
pub struct RestEngine {
    client: Client,
    options: EngineOptions,
    access_token: String,
}

impl RestEngine {
    pub fn new(options: EngineOptions, access_token: impl Into<String>) -> Result<Self> {
        if options.project.is_empty() {
            return Err(GeeError::InvalidRequest(
                "an Earth Engine cloud project is required".into(),
            ));
        }
        let client = Client::builder().timeout(options.request_timeout).build()?;
        Ok(RestEngine {
            client,
            options,
            access_token: access_token.into(),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn project_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.options.endpoint.trim_end_matches('/'),
            self.options.project,
            method
        )
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, url: &str, body: &Value) -> Result<T> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(GeeError::Service {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GeeError::Decode(e.to_string()))
    }

    /// Evaluate a value node and return its JSON result.
    pub async fn compute(&self, node: Value) -> Result<Value> {
        let body = json!({ "expression": expression(node) });
        let response: ComputeResponse = self.post(&self.project_url("value:compute"), &body).await?;
        Ok(response.result)
    }

    /// Create a map from a `maps` request body and build its tile template.
    async fn create_map(&self, body: &Value) -> Result<TileLayer> {
        let map: MapResponse = self.post(&self.project_url("maps"), body).await?;
        let url_format = format!(
            "{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}",
            self.options.endpoint.trim_end_matches('/'),
            map.name
        );
        info!("Published map {}", map.name);
        Ok(TileLayer {
            name: map.name,
            url_format,
        })
    }
}

impl EarthEngine for RestEngine {
    async fn find_boundary(&self, name: &str) -> Result<Option<Geometry>> {
        let feature = self
            .compute(self.options.datasets.boundary_feature(name))
            .await?;
        if feature.is_null() {
            return Ok(None);
        }
        let geometry = feature
            .get("geometry")
            .ok_or_else(|| GeeError::Decode(format!("feature for '{name}' has no geometry")))?;
        Geometry::from_geojson(geometry).map(Some)
    }

    async fn count_scenes(&self, kind: IndexKind, interval: &DateInterval) -> Result<u64> {
        let result = self
            .compute(self.options.datasets.scene_count(interval))
            .await?;
        let count = result
            .as_u64()
            .ok_or_else(|| GeeError::Decode(format!("scene count is not a number: {result}")))?;
        info!("{} scenes of {} in {}", count, kind, interval);
        Ok(count)
    }

    async fn reduce_mean(&self, raster: &Raster, request: &ReduceRequest) -> Result<Option<f64>> {
        let result = self
            .compute(self.options.datasets.reduce_mean(raster, request))
            .await?;
        let band = raster.kind().band_name();
        match result.get(band) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| GeeError::Decode(format!("mean of {band} is not a number: {value}"))),
        }
    }

    async fn publish_layer(&self, raster: &Raster, vis: &Visualization) -> Result<TileLayer> {
        let mut visualization = json!({
            "ranges": [{ "min": vis.min, "max": vis.max }],
            "paletteColors": vis.palette,
        });
        if let Some(opacity) = vis.opacity {
            visualization["opacity"] = json!(opacity);
        }
        let body = json!({
            "expression": expression(self.options.datasets.raster(raster)),
            "fileFormat": "PNG",
            "visualizationOptions": visualization,
        });
        self.create_map(&body).await
    }

    async fn publish_outline(&self, boundary: &Geometry, style: &OutlineStyle) -> Result<TileLayer> {
        let body = json!({
            "expression": expression(outline(boundary, style)),
            "fileFormat": "PNG",
        });
        self.create_map(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineOptions, RestEngine};

    #[test]
    fn test_project_is_required() {
        assert!(RestEngine::new(EngineOptions::default(), "token").is_err());
    }

    #[test]
    fn test_project_url() {
        let options = EngineOptions {
            endpoint: "https://example.test/".into(),
            project: "bloomwatch".into(),
            ..EngineOptions::default()
        };
        let engine = RestEngine::new(options, "token").unwrap();
        assert_eq!(
            engine.project_url("value:compute"),
            "https://example.test/v1/projects/bloomwatch/value:compute"
        );
    }
}
