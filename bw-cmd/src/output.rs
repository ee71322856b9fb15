//! Report rendering and file outputs.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};

use bw_data::explore::{ExploreReport, PublishedLayer, ViewMode};
use bw_data::series::TimeSeries;

/// Write `series` as `year,value` with an empty value for missing years.
pub fn write_series<W: Write>(writer: W, series: &TimeSeries) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for point in series.points() {
        wtr.serialize(point)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_series_csv(path: &str, series: &TimeSeries) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_series(BufWriter::new(file), series)
}

pub fn write_json(path: &str, report: &ExploreReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Human-readable summary of a render.
pub fn format_report(report: &ExploreReport, layers: &[PublishedLayer]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.title());
    let _ = writeln!(out, "Outcome: {:?}", report.outcome);
    let (lat, lon) = report.map_view.center;
    let _ = writeln!(out, "Map: center ({:.2}, {:.2}) zoom {}", lat, lon, report.map_view.zoom);
    if let Some(image) = &report.current {
        let _ = writeln!(
            out,
            "Composite: {} {} from {} scene(s)",
            image.kind, image.period, image.scene_count
        );
    }
    if report.view_mode == ViewMode::Anomaly {
        if let Some(reference) = &report.reference {
            let _ = writeln!(
                out,
                "Anomaly: {} - {} (red: drier/less vegetation, green: greener)",
                report.request.current_year,
                reference.period.year()
            );
        }
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "Warning: {}", warning);
    }
    if let Some(series) = &report.series {
        let _ = writeln!(out, "{} by year ({}):", series.label(), bw_utils::months::month_name(series.month));
        for point in series.points() {
            match point.value {
                Some(value) => {
                    let _ = writeln!(out, "  {}  {:.4}", point.year, value);
                }
                None => {
                    let _ = writeln!(out, "  {}  -", point.year);
                }
            }
        }
        if let Some(mean) = series.mean() {
            let _ = writeln!(out, "  mean  {:.4}", mean);
        }
    }
    for layer in layers {
        let _ = writeln!(out, "Layer {}: {}", layer.title, layer.tiles.url_format);
    }
    out
}
