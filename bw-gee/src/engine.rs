//! The remote service seam.
//!
//! Everything the core needs from the geospatial service goes through
//! [`EarthEngine`]. The REST client implements it against the real API and
//! the mock engine implements it over in-memory grids for tests.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Geometry;
use crate::index::IndexKind;
use crate::period::DateInterval;
use crate::raster::Raster;

/// Nominal resolution for regional means, in meters per pixel.
pub const DEFAULT_SCALE: u32 = 250;

/// Pixel budget for a single regional reduction.
pub const DEFAULT_MAX_PIXELS: f64 = 1e9;

/// Parameters of a spatial mean reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceRequest {
    pub boundary: Geometry,
    pub scale: u32,
    pub max_pixels: f64,
}

impl ReduceRequest {
    pub fn new(boundary: Geometry, scale: u32) -> Self {
        ReduceRequest {
            boundary,
            scale,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// Display parameters for a published map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub min: f64,
    pub max: f64,
    /// Color names or hex codes without `#`.
    pub palette: Vec<String>,
    pub opacity: Option<f64>,
}

impl Visualization {
    /// Raw index values, white to green over 0..9000.
    pub fn index_default() -> Self {
        Visualization {
            min: 0.0,
            max: 9000.0,
            palette: vec!["white".into(), "green".into()],
            opacity: None,
        }
    }

    /// Differences, red (drier) through white to green (greener).
    pub fn anomaly_default() -> Self {
        Visualization {
            min: -2000.0,
            max: 2000.0,
            palette: vec!["FF0000".into(), "FFFFFF".into(), "00FF00".into()],
            opacity: Some(0.8),
        }
    }
}

/// Stroke and fill of a boundary outline layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineStyle {
    /// Hex code without `#`.
    pub color: String,
    pub width: f64,
    /// Hex code with alpha, `00000000` for no fill.
    pub fill_color: String,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        OutlineStyle {
            color: "AAAAAA".into(),
            width: 1.0,
            fill_color: "00000000".into(),
        }
    }
}

/// An XYZ tile source registered with the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// Template with `{z}`, `{x}` and `{y}` placeholders.
    pub url_format: String,
}

/// Operations of the external geospatial service.
///
/// Calls are awaited one at a time by the core; implementations need not be
/// `Send` or `Sync`.
#[allow(async_fn_in_trait)]
pub trait EarthEngine {
    /// Geometry of the first boundary feature whose name attribute equals
    /// `name` exactly, or `None` if there is none.
    async fn find_boundary(&self, name: &str) -> Result<Option<Geometry>>;

    /// Number of archive scenes of `kind` whose start time falls in `interval`.
    async fn count_scenes(&self, kind: IndexKind, interval: &DateInterval) -> Result<u64>;

    /// Mean of `raster` over the request boundary; `None` when no valid
    /// pixel falls inside it.
    async fn reduce_mean(&self, raster: &Raster, request: &ReduceRequest) -> Result<Option<f64>>;

    /// Register `raster` for map display.
    async fn publish_layer(&self, raster: &Raster, vis: &Visualization) -> Result<TileLayer>;

    /// Register the outline of `boundary` for map display.
    async fn publish_outline(&self, boundary: &Geometry, style: &OutlineStyle) -> Result<TileLayer>;
}
