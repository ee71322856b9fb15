//! One full dashboard render.
//!
//! [`Explorer::explore`] runs the whole chain for a set of user selections
//! (current composite, region, optional reference composite and anomaly,
//! optional chart series) and reports what happened as data. Nothing in
//! here aborts a render: each failure picks the degraded continuation the
//! dashboard shows and leaves a [`Warning`] behind.

use log::{info, warn};
use serde::Serialize;
use std::fmt;

use bw_gee::engine::{EarthEngine, OutlineStyle, TileLayer, Visualization, DEFAULT_SCALE};
use bw_gee::error::{GeeError, Result};
use bw_gee::index::IndexKind;
use bw_gee::period::Period;
use bw_gee::raster::{anomaly, IndexImage, Raster};
use bw_gee::year_range::YearRange;
use bw_utils::months::month_name;
use bw_utils::years::chart_years;

use crate::region::{FallbackCause, Region, RegionStatus};
use crate::series::TimeSeries;
use crate::Explorer;

/// Map center used when no region boundary is available.
pub const GLOBAL_CENTER: (f64, f64) = (20.0, 0.0);
pub const GLOBAL_ZOOM: u8 = 2;
pub const REGION_ZOOM: u8 = 5;

/// User selections for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreRequest {
    pub region: String,
    pub month: u32,
    pub current_year: i32,
    /// Baseline year for anomaly detection; `None` for a single view.
    pub reference_year: Option<i32>,
    pub kind: IndexKind,
    /// Inclusive year span of the chart; `None` for no chart.
    pub chart_years: Option<(i32, i32)>,
    /// Reduction resolution in meters per pixel.
    pub scale: u32,
}

impl ExploreRequest {
    pub fn new(region: &str, month: u32, current_year: i32, kind: IndexKind) -> Self {
        ExploreRequest {
            region: region.to_string(),
            month,
            current_year,
            reference_year: None,
            kind,
            chart_years: None,
            scale: DEFAULT_SCALE,
        }
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn with_chart_years(mut self, from: i32, to: i32) -> Self {
        self.chart_years = Some((from, to));
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        Period::new(self.current_year, self.month)?;
        if let Some(reference) = self.reference_year {
            if reference == self.current_year {
                return Err(GeeError::InvalidRequest(
                    "reference year must differ from the current year".into(),
                ));
            }
            Period::new(reference, self.month)?;
        }
        if let Some((from, to)) = self.chart_years {
            if from > to {
                return Err(GeeError::InvalidRequest(format!(
                    "chart years {from}..{to} run backwards"
                )));
            }
            let allowed = chart_years();
            if !allowed.contains(&from) || !allowed.contains(&to) {
                return Err(GeeError::InvalidRequest(format!(
                    "chart years {from}..{to} outside {}..{}",
                    allowed.start(),
                    allowed.end()
                )));
            }
        }
        if self.scale == 0 {
            return Err(GeeError::InvalidRequest("scale must be positive".into()));
        }
        Ok(())
    }
}

/// Overall result of a render, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// No imagery for the selected month; nothing but a global map.
    NoData,
    /// The region name did not match; global view without chart.
    RegionNotFound,
    /// Rendered with something missing (see warnings).
    Degraded,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewMode {
    Single,
    Anomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    NoImagery { kind: IndexKind, period: Period },
    RegionNotFound { name: String },
    ServiceUnavailable { context: String, message: String },
    ReferenceUnavailable { year: i32 },
    ChartUnavailable,
}

/// Where the map should look.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    /// `(latitude, longitude)`
    pub center: (f64, f64),
    pub zoom: u8,
}

impl MapView {
    pub fn global() -> Self {
        MapView {
            center: GLOBAL_CENTER,
            zoom: GLOBAL_ZOOM,
        }
    }

    pub fn for_region(region: &Region) -> Self {
        match region.resolved_boundary().and_then(|b| b.centroid()) {
            Some(center) => MapView {
                center,
                zoom: REGION_ZOOM,
            },
            None => MapView::global(),
        }
    }
}

/// A raster layer registered with the service, ready for a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedLayer {
    pub title: String,
    pub tiles: TileLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreReport {
    pub request: ExploreRequest,
    pub outcome: Outcome,
    pub view_mode: ViewMode,
    pub map_view: MapView,
    pub region: Option<Region>,
    pub current: Option<IndexImage>,
    pub reference: Option<IndexImage>,
    /// Current composite, clipped to the region when it was found.
    #[serde(skip)]
    pub current_layer: Option<Raster>,
    /// `current - reference`, both clipped, in anomaly mode.
    #[serde(skip)]
    pub anomaly_layer: Option<Raster>,
    pub series: Option<TimeSeries>,
    pub warnings: Vec<Warning>,
}

impl ExploreReport {
    fn new(request: &ExploreRequest) -> Self {
        ExploreReport {
            request: request.clone(),
            outcome: Outcome::Success,
            view_mode: ViewMode::Single,
            map_view: MapView::global(),
            region: None,
            current: None,
            reference: None,
            current_layer: None,
            anomaly_layer: None,
            series: None,
            warnings: Vec::new(),
        }
    }

    /// Title of the map, e.g. "NDVI Pakistan May 2024".
    pub fn title(&self) -> String {
        let request = &self.request;
        let place = match &self.region {
            Some(region) if region.is_found() => region.name(),
            _ => "Global View",
        };
        let month = month_name(request.month);
        match (self.view_mode, request.reference_year) {
            (ViewMode::Anomaly, Some(reference)) => format!(
                "{} Anomaly for {} {} {} vs {}",
                request.kind, place, month, request.current_year, reference
            ),
            _ => format!("{} {} {} {}", request.kind, place, month, request.current_year),
        }
    }

    fn finish(mut self) -> Self {
        let region_not_found = matches!(
            self.region.as_ref().map(Region::status),
            Some(RegionStatus::FallbackGlobal(FallbackCause::NotFound))
        );
        let no_imagery = self
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::NoImagery { .. }));
        self.outcome = if no_imagery {
            Outcome::NoData
        } else if region_not_found {
            Outcome::RegionNotFound
        } else if !self.warnings.is_empty() {
            Outcome::Degraded
        } else {
            Outcome::Success
        };
        self
    }
}

impl<E: EarthEngine> Explorer<E> {
    /// Run one render for `request`.
    ///
    /// Only an invalid request is an error; every remote failure is folded
    /// into the report.
    pub async fn explore(&mut self, request: &ExploreRequest) -> Result<ExploreReport> {
        request.validate()?;
        let mut report = ExploreReport::new(request);
        let kind = request.kind;
        let period = Period::new(request.current_year, request.month)?;

        let current = match self.index_image(period, kind).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                warn!("No {} imagery for {}", kind, period);
                report.warnings.push(Warning::NoImagery { kind, period });
                return Ok(report.finish());
            }
            Err(e) => {
                warn!("Failed to load {} for {}: {}", kind, period, e);
                report.warnings.push(Warning::ServiceUnavailable {
                    context: format!("{kind} imagery for {period}"),
                    message: e.to_string(),
                });
                return Ok(report.finish());
            }
        };

        let region = self.resolve_region(&request.region).await;
        match region.status() {
            RegionStatus::Found => {}
            RegionStatus::FallbackGlobal(FallbackCause::NotFound) => {
                report.warnings.push(Warning::RegionNotFound {
                    name: request.region.clone(),
                });
            }
            RegionStatus::FallbackGlobal(FallbackCause::ServiceError(message)) => {
                report.warnings.push(Warning::ServiceUnavailable {
                    context: format!("region '{}'", request.region),
                    message: message.clone(),
                });
            }
        }
        report.map_view = MapView::for_region(&region);
        let current_layer = match region.resolved_boundary() {
            Some(boundary) => current.clip(boundary),
            None => current.raster(),
        };

        if let Some(reference_year) = request.reference_year {
            let reference = match self.index_image(period.with_year(reference_year)?, kind).await {
                Ok(image) => image,
                Err(e) => {
                    warn!("Failed to load {} reference for {}: {}", kind, reference_year, e);
                    report.warnings.push(Warning::ServiceUnavailable {
                        context: format!("{kind} reference imagery for {reference_year}"),
                        message: e.to_string(),
                    });
                    None
                }
            };
            match (&reference, region.resolved_boundary()) {
                (Some(image), Some(boundary)) => {
                    report.anomaly_layer = Some(anomaly(&current_layer, &image.clip(boundary)));
                    report.view_mode = ViewMode::Anomaly;
                }
                _ => {
                    warn!("Anomaly unavailable for {}, showing single view", reference_year);
                    report
                        .warnings
                        .push(Warning::ReferenceUnavailable { year: reference_year });
                }
            }
            report.reference = reference;
        }

        if let (Some((from, to)), Some(boundary)) = (request.chart_years, region.resolved_boundary()) {
            let years: Vec<i32> = YearRange(from, to).collect();
            let series = self
                .build_series(&years, request.month, kind, Some(boundary), request.scale)
                .await?;
            if !series.has_values() {
                report.warnings.push(Warning::ChartUnavailable);
            }
            info!(
                "{} series for {}: {} of {} years with data",
                kind,
                region.name(),
                series.values().count(),
                series.len()
            );
            report.series = Some(series);
        }

        report.current = Some(current);
        report.current_layer = Some(current_layer);
        report.region = Some(region);
        Ok(report.finish())
    }

    /// Register the layers a report displays: the anomaly in anomaly mode,
    /// the current composite otherwise, then the region outline when the
    /// region was found.
    pub async fn publish_layers(
        &self,
        report: &ExploreReport,
        index_vis: &Visualization,
    ) -> Result<Vec<PublishedLayer>> {
        let request = &report.request;
        let mut layers = Vec::new();
        match (&report.anomaly_layer, &report.current_layer, request.reference_year) {
            (Some(anomaly), _, Some(reference)) => {
                let tiles = self
                    .engine
                    .publish_layer(anomaly, &Visualization::anomaly_default())
                    .await?;
                layers.push(PublishedLayer {
                    title: format!("ANOMALY: {} - {}", request.current_year, reference),
                    tiles,
                });
            }
            (_, Some(current), _) => {
                let tiles = self.engine.publish_layer(current, index_vis).await?;
                layers.push(PublishedLayer {
                    title: format!(
                        "{} {} {}",
                        request.kind,
                        month_name(request.month),
                        request.current_year
                    ),
                    tiles,
                });
            }
            _ => {}
        }
        if let Some(region) = report.region.as_ref().filter(|r| r.is_found()) {
            let tiles = self
                .engine
                .publish_outline(region.boundary(), &OutlineStyle::default())
                .await?;
            layers.push(PublishedLayer {
                title: format!("{} Boundary", region.name()),
                tiles,
            });
        }
        Ok(layers)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoImagery { kind, period } => write!(
                f,
                "No MODIS data found for {} for {} {}. Try a different date/year.",
                kind,
                month_name(period.month()),
                period.year()
            ),
            Warning::RegionNotFound { name } => write!(
                f,
                "Could not locate region '{}' in the dataset. Showing global view instead.",
                name
            ),
            Warning::ServiceUnavailable { context, message } => {
                write!(f, "Earth Engine request for {} failed: {}", context, message)
            }
            Warning::ReferenceUnavailable { year } => write!(
                f,
                "Could not load data for the reference year {} or region not found. Showing single view instead.",
                year
            ),
            Warning::ChartUnavailable => write!(
                f,
                "Data retrieval for the chart failed. Check the selected region/time."
            ),
        }
    }
}
