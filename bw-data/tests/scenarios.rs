//! End-to-end dashboard scenarios against the in-memory engine.

use bw_data::cache::{ImageCache, SeriesCache};
use bw_data::explore::{ExploreRequest, Outcome, ViewMode, Warning};
use bw_data::region::{FallbackCause, RegionStatus};
use bw_data::{anomaly, Explorer};
use bw_gee::geometry::Geometry;
use bw_gee::index::IndexKind;
use bw_gee::mock::MockEngine;
use bw_gee::period::Period;
use bw_gee::raster::Raster;
use bw_gee::year_range::YearRange;

fn pakistan() -> Geometry {
    Geometry::Polygon {
        coordinates: vec![vec![
            [60.9, 23.7],
            [77.8, 23.7],
            [77.8, 37.1],
            [60.9, 37.1],
            [60.9, 23.7],
        ]],
    }
}

fn archive() -> MockEngine {
    YearRange(2018, 2024).fold(
        MockEngine::new().with_boundary("Pakistan", pakistan()),
        |engine, year| {
            engine.with_scenes(
                IndexKind::Ndvi,
                year,
                5,
                vec![
                    vec![Some(3000.0 + 100.0 * (year - 2018) as f64), Some(2000.0), None],
                    vec![Some(3200.0), None, None],
                ],
            )
        },
    )
}

#[tokio::test]
async fn pakistan_may_2024_anomaly_against_2021() {
    let mut explorer = Explorer::new(archive());
    let request = ExploreRequest::new("Pakistan", 5, 2024, IndexKind::Ndvi)
        .with_reference_year(2021)
        .with_chart_years(2018, 2024);
    let report = explorer.explore(&request).await.unwrap();

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.view_mode, ViewMode::Anomaly);
    let region = report.region.as_ref().unwrap();
    assert_eq!(region.status(), &RegionStatus::Found);
    assert!(!region.boundary().is_world());

    let (lat, lon) = report.map_view.center;
    assert!((lat - 30.4).abs() < 1e-9);
    assert!((lon - 69.35).abs() < 1e-9);

    // anomaly is current - reference, both clipped to the region
    let current = report.current_layer.clone().unwrap();
    let reference = Raster::Composite {
        kind: IndexKind::Ndvi,
        period: Period::new(2021, 5).unwrap(),
    }
    .clip(&pakistan());
    assert_eq!(report.anomaly_layer, Some(anomaly(&current, &reference)));
    let grid = explorer.engine().evaluate(report.anomaly_layer.as_ref().unwrap()).unwrap();
    assert_eq!(grid, vec![Some(150.0), Some(0.0), None]);

    let series = report.series.as_ref().unwrap();
    assert_eq!(series.len(), 7);
    let years: Vec<i32> = series.points().iter().map(|p| p.year).collect();
    assert_eq!(years, (2018..=2024).collect::<Vec<_>>());
    assert!(series.values().all(|v| (-1.0..=1.0).contains(&v)));
    assert!(series.points().iter().all(|p| p.value.is_some()));
}

#[tokio::test]
async fn unknown_region_renders_global_view() {
    let mut explorer = Explorer::new(archive());
    let request = ExploreRequest::new("Atlantis", 5, 2024, IndexKind::Ndvi)
        .with_reference_year(2021)
        .with_chart_years(2018, 2024);
    let report = explorer.explore(&request).await.unwrap();

    assert_eq!(report.outcome, Outcome::RegionNotFound);
    assert_eq!(
        report.region.as_ref().unwrap().status(),
        &RegionStatus::FallbackGlobal(FallbackCause::NotFound)
    );
    assert_eq!(report.map_view.center, (20.0, 0.0));
    assert_eq!(report.map_view.zoom, 2);
    assert!(report.series.is_none());
    assert!(report.anomaly_layer.is_none());
    assert!(report.warnings.contains(&Warning::RegionNotFound {
        name: "Atlantis".into()
    }));
}

#[tokio::test]
async fn month_without_scenes_is_no_data() {
    let mut explorer = Explorer::new(archive());
    let report = explorer
        .explore(&ExploreRequest::new("Pakistan", 6, 2024, IndexKind::Ndvi))
        .await
        .unwrap();
    assert_eq!(report.outcome, Outcome::NoData);
    assert!(report.current.is_none());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].to_string().starts_with("No MODIS data found for NDVI for June 2024"));
}

#[tokio::test]
async fn repeated_render_reuses_composites_and_series() {
    let mut explorer = Explorer::new(archive());
    let request = ExploreRequest::new("Pakistan", 5, 2024, IndexKind::Ndvi).with_chart_years(2018, 2024);
    let first = explorer.explore(&request).await.unwrap();
    let counts = explorer.engine().scene_counts();
    let reductions = explorer.engine().reductions();

    let second = explorer.explore(&request).await.unwrap();
    assert_eq!(first.series, second.series);
    assert_eq!(explorer.engine().scene_counts(), counts);
    assert_eq!(explorer.engine().reductions(), reductions);
    // region lookups are not memoized
    assert_eq!(explorer.engine().boundary_queries(), 2);
}

#[tokio::test]
async fn warm_caches_carry_over_to_a_new_explorer() {
    let mut explorer = Explorer::new(archive());
    let request = ExploreRequest::new("Pakistan", 5, 2024, IndexKind::Ndvi).with_chart_years(2018, 2024);
    explorer.explore(&request).await.unwrap();
    let (_, images, series): (_, ImageCache, SeriesCache) = explorer.into_parts();

    let mut explorer = Explorer::with_caches(archive(), images, series);
    explorer.explore(&request).await.unwrap();
    assert_eq!(explorer.engine().scene_counts(), 0);
    assert_eq!(explorer.engine().reductions(), 0);
}

#[tokio::test]
async fn world_boundary_series_is_empty() {
    let mut explorer = Explorer::new(archive());
    let years: Vec<i32> = YearRange(2000, 2024).collect();
    let series = explorer
        .build_series(&years, 5, IndexKind::Ndvi, Some(&Geometry::world()), 250)
        .await
        .unwrap();
    assert!(series.is_empty());
    assert_eq!(explorer.engine().reductions(), 0);
}
