//! In-memory [`EarthEngine`] for tests.
//!
//! Scenes are small pixel grids of integer-encoded index values (`None` for
//! masked pixels). Rasters are evaluated locally by walking the expression,
//! and every trait call is counted so tests can assert on remote traffic.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::engine::{EarthEngine, OutlineStyle, ReduceRequest, TileLayer, Visualization};
use crate::error::{GeeError, Result};
use crate::geometry::{Geometry, GeometryKey};
use crate::index::IndexKind;
use crate::period::{DateInterval, Period};
use crate::raster::Raster;

pub type Grid = Vec<Option<f64>>;

#[derive(Default)]
pub struct MockEngine {
    boundaries: HashMap<String, Geometry>,
    scenes: HashMap<(IndexKind, Period), Vec<Grid>>,
    /// Boundaries that cover no valid pixel.
    empty_boundaries: HashSet<GeometryKey>,
    failing_years: HashSet<i32>,
    unreachable: Cell<bool>,
    boundary_queries: Cell<usize>,
    scene_counts: Cell<usize>,
    reductions: Cell<usize>,
    publications: Cell<usize>,
    reduced: RefCell<Vec<Raster>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary(mut self, name: &str, geometry: Geometry) -> Self {
        self.boundaries.insert(name.to_string(), geometry);
        self
    }

    pub fn with_scenes(mut self, kind: IndexKind, year: i32, month: u32, scenes: Vec<Grid>) -> Self {
        let period = Period::new(year, month).expect("valid mock period");
        self.scenes.entry((kind, period)).or_default().extend(scenes);
        self
    }

    /// A single scene with the same value at every one of `pixels` pixels.
    pub fn with_uniform_scene(self, kind: IndexKind, year: i32, month: u32, value: f64, pixels: usize) -> Self {
        self.with_scenes(kind, year, month, vec![vec![Some(value); pixels]])
    }

    pub fn with_empty_boundary(mut self, geometry: &Geometry) -> Self {
        self.empty_boundaries.insert(geometry.key());
        self
    }

    /// Scene counts and reductions touching `year` fail with a service error.
    pub fn with_failing_year(mut self, year: i32) -> Self {
        self.failing_years.insert(year);
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.set(unreachable);
    }

    pub fn boundary_queries(&self) -> usize {
        self.boundary_queries.get()
    }

    pub fn scene_counts(&self) -> usize {
        self.scene_counts.get()
    }

    pub fn reductions(&self) -> usize {
        self.reductions.get()
    }

    pub fn publications(&self) -> usize {
        self.publications.get()
    }

    /// Rasters passed to `reduce_mean`, in call order.
    pub fn reduced(&self) -> Vec<Raster> {
        self.reduced.borrow().clone()
    }

    fn check_year(&self, year: i32) -> Result<()> {
        if self.failing_years.contains(&year) {
            return Err(GeeError::Service {
                status: 500,
                message: format!("mock failure for {year}"),
            });
        }
        Ok(())
    }

    fn tiles(&self, label: &str) -> TileLayer {
        let name = format!("projects/mock/maps/{}-{}", label, self.publications.get());
        TileLayer {
            url_format: format!("mock://{name}/tiles/{{z}}/{{x}}/{{y}}"),
            name,
        }
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.get() {
            return Err(GeeError::Service {
                status: 503,
                message: "mock service unavailable".into(),
            });
        }
        Ok(())
    }

    /// Evaluate a raster pixel-wise; `None` if it has no source scenes.
    pub fn evaluate(&self, raster: &Raster) -> Option<Grid> {
        match raster {
            Raster::Composite { kind, period } => {
                let scenes = self.scenes.get(&(*kind, *period))?;
                let width = scenes.first()?.len();
                let grid = (0..width)
                    .map(|i| {
                        let valid: Vec<f64> = scenes.iter().filter_map(|s| s.get(i).copied().flatten()).collect();
                        if valid.is_empty() {
                            None
                        } else {
                            Some(valid.iter().sum::<f64>() / valid.len() as f64)
                        }
                    })
                    .collect();
                Some(grid)
            }
            Raster::Clipped { source, boundary } => {
                let grid = self.evaluate(source)?;
                if self.empty_boundaries.contains(&boundary.key()) {
                    Some(vec![None; grid.len()])
                } else {
                    Some(grid)
                }
            }
            Raster::Difference {
                minuend,
                subtrahend,
            } => {
                let a = self.evaluate(minuend)?;
                let b = self.evaluate(subtrahend)?;
                Some(
                    a.iter()
                        .zip(b.iter())
                        .map(|(a, b)| match (a, b) {
                            (Some(a), Some(b)) => Some(a - b),
                            _ => None,
                        })
                        .collect(),
                )
            }
        }
    }
}

fn years_of(raster: &Raster, years: &mut Vec<i32>) {
    match raster {
        Raster::Composite { period, .. } => years.push(period.year()),
        Raster::Clipped { source, .. } => years_of(source, years),
        Raster::Difference {
            minuend,
            subtrahend,
        } => {
            years_of(minuend, years);
            years_of(subtrahend, years);
        }
    }
}

impl EarthEngine for MockEngine {
    async fn find_boundary(&self, name: &str) -> Result<Option<Geometry>> {
        self.boundary_queries.set(self.boundary_queries.get() + 1);
        self.check_reachable()?;
        Ok(self.boundaries.get(name).cloned())
    }

    async fn count_scenes(&self, kind: IndexKind, interval: &DateInterval) -> Result<u64> {
        self.scene_counts.set(self.scene_counts.get() + 1);
        self.check_reachable()?;
        let period = Period::from(interval.start);
        self.check_year(period.year())?;
        Ok(self
            .scenes
            .get(&(kind, period))
            .map_or(0, |scenes| scenes.len() as u64))
    }

    async fn reduce_mean(&self, raster: &Raster, request: &ReduceRequest) -> Result<Option<f64>> {
        self.reductions.set(self.reductions.get() + 1);
        self.reduced.borrow_mut().push(raster.clone());
        self.check_reachable()?;
        let mut years = Vec::new();
        years_of(raster, &mut years);
        for year in years {
            self.check_year(year)?;
        }
        let grid = self
            .evaluate(raster)
            .ok_or_else(|| GeeError::Decode("image has no bands".into()))?;
        if self.empty_boundaries.contains(&request.boundary.key()) {
            return Ok(None);
        }
        let valid: Vec<f64> = grid.into_iter().flatten().collect();
        if valid.is_empty() {
            return Ok(None);
        }
        Ok(Some(valid.iter().sum::<f64>() / valid.len() as f64))
    }

    async fn publish_layer(&self, raster: &Raster, _vis: &Visualization) -> Result<TileLayer> {
        self.publications.set(self.publications.get() + 1);
        self.check_reachable()?;
        Ok(self.tiles(&raster.kind().to_string()))
    }

    async fn publish_outline(&self, _boundary: &Geometry, _style: &OutlineStyle) -> Result<TileLayer> {
        self.publications.set(self.publications.get() + 1);
        self.check_reachable()?;
        Ok(self.tiles("boundary"))
    }
}

#[cfg(test)]
mod tests {
    use super::MockEngine;
    use crate::engine::{EarthEngine, ReduceRequest};
    use crate::geometry::Geometry;
    use crate::index::IndexKind;
    use crate::period::Period;
    use crate::raster::{anomaly, Raster};

    fn composite(year: i32) -> Raster {
        Raster::Composite {
            kind: IndexKind::Ndvi,
            period: Period::new(year, 5).unwrap(),
        }
    }

    fn engine() -> MockEngine {
        MockEngine::new()
            .with_scenes(
                IndexKind::Ndvi,
                2024,
                5,
                vec![
                    vec![Some(6000.0), Some(3000.0), None, Some(-500.0)],
                    vec![Some(7000.0), None, None, Some(500.0)],
                ],
            )
            .with_scenes(
                IndexKind::Ndvi,
                2021,
                5,
                vec![vec![Some(4000.0), Some(3500.0), Some(1000.0), Some(250.0)]],
            )
    }

    #[test]
    fn test_composite_is_pixelwise_mean_of_valid_scenes() {
        let grid = engine().evaluate(&composite(2024)).unwrap();
        assert_eq!(grid, vec![Some(6500.0), Some(3000.0), None, Some(0.0)]);
        assert!(engine().evaluate(&composite(2019)).is_none());
    }

    #[test]
    fn test_anomaly_is_antisymmetric() {
        let engine = engine();
        let boundary = Geometry::world();
        let current = composite(2024).clip(&boundary);
        let reference = composite(2021).clip(&boundary);
        let forward = engine.evaluate(&anomaly(&current, &reference)).unwrap();
        let backward = engine.evaluate(&anomaly(&reference, &current)).unwrap();
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(backward.iter()) {
            assert_eq!(*f, b.map(|v| -v));
        }
        assert_eq!(forward[0], Some(2500.0));
        assert_eq!(forward[2], None);
    }

    #[tokio::test]
    async fn test_counts_and_outage() {
        let engine = engine();
        let interval = Period::new(2024, 5).unwrap().interval();
        assert_eq!(engine.count_scenes(IndexKind::Ndvi, &interval).await.unwrap(), 2);
        assert_eq!(engine.count_scenes(IndexKind::Evi, &interval).await.unwrap(), 0);
        assert_eq!(engine.scene_counts(), 2);

        let request = ReduceRequest::new(Geometry::world(), 250);
        let mean = engine.reduce_mean(&composite(2024), &request).await.unwrap();
        assert_eq!(mean, Some(9500.0 / 3.0));

        engine.set_unreachable(true);
        assert!(engine.find_boundary("Pakistan").await.is_err());
        assert_eq!(engine.boundary_queries(), 1);
    }
}
