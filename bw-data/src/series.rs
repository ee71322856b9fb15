//! Yearly regional means of a monthly index.
//!
//! A series is only defined over a resolved boundary. Each year costs one
//! scene count (unless cached) and one regional reduction; a year that fails
//! for any reason becomes a missing point so the rest of the chart still
//! renders.

use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

use bw_gee::engine::{EarthEngine, ReduceRequest};
use bw_gee::error::{GeeError, Result};
use bw_gee::geometry::Geometry;
use bw_gee::index::IndexKind;
use bw_gee::period::Period;

use crate::cache::SeriesKey;
use crate::Explorer;

/// One year of a series; `value` is `None` when missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

/// Regional mean of one (month, index) over several years, ascending by
/// year without duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub kind: IndexKind,
    pub month: u32,
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    fn empty(kind: IndexKind, month: u32) -> Self {
        TimeSeries {
            kind,
            month,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Chart column label, e.g. "Avg NDVI".
    pub fn label(&self) -> String {
        format!("Avg {}", self.kind)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.value)
    }

    /// True if at least one year has a value.
    pub fn has_values(&self) -> bool {
        self.values().next().is_some()
    }

    /// Mean over the years that have a value.
    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self.values().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }
}

impl<E: EarthEngine> Explorer<E> {
    /// Regional mean of `kind` in `month` for each of `years`.
    ///
    /// Returns an empty series when `boundary` is absent or the world
    /// fallback. Only invalid arguments are errors; per-year failures become
    /// missing points. A series with a point lost to a service failure is
    /// returned but not memoized.
    pub async fn build_series(
        &mut self,
        years: &[i32],
        month: u32,
        kind: IndexKind,
        boundary: Option<&Geometry>,
        scale: u32,
    ) -> Result<TimeSeries> {
        if !(1..=12).contains(&month) {
            return Err(GeeError::InvalidMonth(month));
        }
        if scale == 0 {
            return Err(GeeError::InvalidRequest("scale must be positive".into()));
        }
        let boundary = match boundary {
            Some(b) if !b.is_world() => b,
            _ => {
                info!("No resolved boundary, skipping {} series", kind);
                return Ok(TimeSeries::empty(kind, month));
            }
        };

        let years: Vec<i32> = years.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let key = SeriesKey {
            years: years.clone(),
            month,
            kind,
            boundary: boundary.key(),
            scale,
        };
        if let Some(cached) = self.series.get(&key) {
            return Ok(cached);
        }

        let request = ReduceRequest::new(boundary.clone(), scale);
        let mut points = Vec::with_capacity(years.len());
        let mut service_failures = 0;
        for year in years {
            let value = match self.year_mean(year, month, kind, &request).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("{} mean for {}-{:02} unavailable: {}", kind, year, month, e);
                    if e.is_service_failure() {
                        service_failures += 1;
                    }
                    None
                }
            };
            points.push(SeriesPoint { year, value });
        }

        let series = TimeSeries {
            kind,
            month,
            points,
        };
        if service_failures == 0 {
            self.series.insert(key, series.clone());
        } else {
            warn!(
                "Not caching {} series: {} year(s) failed remotely",
                kind, service_failures
            );
        }
        Ok(series)
    }

    async fn year_mean(
        &mut self,
        year: i32,
        month: u32,
        kind: IndexKind,
        request: &ReduceRequest,
    ) -> Result<Option<f64>> {
        let period = Period::new(year, month)?;
        let Some(image) = self.index_image(period, kind).await? else {
            return Ok(None);
        };
        let clipped = image.clip(&request.boundary);
        let mean = self.engine.reduce_mean(&clipped, request).await?;
        Ok(mean.filter(|v| v.is_finite()).map(IndexKind::rescale))
    }
}
