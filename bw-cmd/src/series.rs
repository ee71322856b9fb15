//! The `series` subcommand: a yearly chart without the map.

use log::info;
use std::io;

use bw_data::series::TimeSeries;
use bw_data::Explorer;
use bw_gee::engine::EarthEngine;
use bw_gee::index::IndexKind;
use bw_gee::year_range::YearRange;
use bw_utils::years::chart_years;

use crate::output;
use crate::EngineArgs;

/// Resolve `region` and build its series over the inclusive `years` span.
///
/// Fails if the region cannot be resolved, since a chart over the global
/// fallback is not defined.
pub async fn region_series<E: EarthEngine>(
    explorer: &mut Explorer<E>,
    region: &str,
    month: u32,
    years: (i32, i32),
    kind: IndexKind,
    scale: u32,
) -> anyhow::Result<TimeSeries> {
    let allowed = chart_years();
    if !allowed.contains(&years.0) || !allowed.contains(&years.1) {
        anyhow::bail!(
            "years {}..{} outside {}..{}",
            years.0,
            years.1,
            allowed.start(),
            allowed.end()
        );
    }
    let resolved = explorer.resolve_region(region).await;
    let Some(boundary) = resolved.resolved_boundary() else {
        anyhow::bail!("could not locate region '{}': {:?}", region, resolved.status());
    };
    let years: Vec<i32> = YearRange(years.0, years.1).collect();
    let series = explorer
        .build_series(&years, month, kind, Some(boundary), scale)
        .await?;
    info!(
        "{} for {}: {} of {} years with data",
        series.label(),
        region,
        series.values().count(),
        series.len()
    );
    Ok(series)
}

pub async fn run_series(
    engine: &EngineArgs,
    region: &str,
    month: u32,
    years: (i32, i32),
    kind: IndexKind,
    scale: u32,
    csv_path: Option<&str>,
) -> anyhow::Result<()> {
    let mut explorer = Explorer::new(engine.connect()?);
    let series = region_series(&mut explorer, region, month, years, kind, scale).await?;
    match csv_path {
        Some(path) => {
            output::write_series_csv(path, &series)?;
            info!("Series written to {}", path);
        }
        None => output::write_series(io::stdout().lock(), &series)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_gee::geometry::Geometry;
    use bw_gee::mock::MockEngine;

    fn engine() -> MockEngine {
        MockEngine::new()
            .with_boundary(
                "Spain",
                Geometry::BBox {
                    west: -9.3,
                    south: 36.0,
                    east: 3.3,
                    north: 43.8,
                },
            )
            .with_uniform_scene(IndexKind::Ndvi, 2019, 4, 5500.0, 4)
            .with_uniform_scene(IndexKind::Ndvi, 2020, 4, 5900.0, 4)
    }

    #[tokio::test]
    async fn test_region_series() {
        let mut explorer = Explorer::new(engine());
        let series = region_series(&mut explorer, "Spain", 4, (2019, 2021), IndexKind::Ndvi, 250)
            .await
            .unwrap();
        let values: Vec<Option<f64>> = series.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(0.55), Some(0.59), None]);
    }

    #[tokio::test]
    async fn test_years_outside_record_fail_before_remote_calls() {
        let mut explorer = Explorer::new(engine());
        for years in [(1, 2_000_000_000), (i32::MAX, i32::MAX), (1999, 2020)] {
            let result = region_series(&mut explorer, "Spain", 4, years, IndexKind::Ndvi, 250).await;
            assert!(result.is_err());
        }
        assert_eq!(explorer.engine().boundary_queries(), 0);
    }

    #[tokio::test]
    async fn test_unknown_region_fails() {
        let mut explorer = Explorer::new(engine());
        let result = region_series(&mut explorer, "Narnia", 4, (2019, 2021), IndexKind::Ndvi, 250).await;
        assert!(result.is_err());
        assert_eq!(explorer.engine().reductions(), 0);
    }
}
