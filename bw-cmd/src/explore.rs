//! The `explore` subcommand: one dashboard render from the terminal.

use clap::Args;
use log::info;

use bw_data::explore::{ExploreReport, ExploreRequest, PublishedLayer};
use bw_data::Explorer;
use bw_gee::engine::{EarthEngine, Visualization, DEFAULT_SCALE};
use bw_gee::index::IndexKind;
use bw_utils::months::parse_month;
use bw_utils::years::{current_year, parse_year_range};

use crate::output;
use crate::EngineArgs;

/// Selections of a single render.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Region (country) name, exact match; empty for the global view
    #[arg(short, long, default_value = "")]
    pub region: String,

    /// Month as number or name
    #[arg(short, long, value_parser = parse_month)]
    pub month: u32,

    /// Year to display (defaults to the current year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Baseline year; switches to anomaly detection
    #[arg(long)]
    pub reference_year: Option<i32>,

    /// Vegetation index (NDVI or EVI)
    #[arg(short, long, default_value = "NDVI")]
    pub index: IndexKind,

    /// Chart year span, e.g. 2018-2024
    #[arg(short, long, value_parser = parse_year_range)]
    pub chart_years: Option<(i32, i32)>,

    /// Reduction scale in meters per pixel
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    pub scale: u32,

    /// Also register the displayed layers and print their tile URLs
    #[arg(long)]
    pub tiles: bool,

    /// Index layer minimum (raw units)
    #[arg(long, default_value_t = 0.0)]
    pub vis_min: f64,

    /// Index layer maximum (raw units)
    #[arg(long, default_value_t = 9000.0)]
    pub vis_max: f64,

    /// Index layer palette, comma separated
    #[arg(long, value_delimiter = ',', default_value = "white,green")]
    pub palette: Vec<String>,

    /// Output path for the JSON report
    #[arg(long)]
    pub json: Option<String>,

    /// Output path for the chart series CSV
    #[arg(long)]
    pub series_csv: Option<String>,
}

impl ViewArgs {
    pub fn request(&self) -> ExploreRequest {
        let mut request = ExploreRequest::new(
            &self.region,
            self.month,
            self.year.unwrap_or_else(current_year),
            self.index,
        )
        .with_scale(self.scale);
        if let Some(reference) = self.reference_year {
            request = request.with_reference_year(reference);
        }
        if let Some((from, to)) = self.chart_years {
            request = request.with_chart_years(from, to);
        }
        request
    }

    pub fn visualization(&self) -> Visualization {
        Visualization {
            min: self.vis_min,
            max: self.vis_max,
            palette: self.palette.clone(),
            opacity: None,
        }
    }
}

/// Run the render against any engine and return the report plus the
/// published layers (empty unless `--tiles`).
pub async fn render<E: EarthEngine>(
    explorer: &mut Explorer<E>,
    view: &ViewArgs,
) -> anyhow::Result<(ExploreReport, Vec<PublishedLayer>)> {
    let request = view.request();
    let report = explorer.explore(&request).await?;
    let layers = if view.tiles {
        explorer.publish_layers(&report, &view.visualization()).await?
    } else {
        Vec::new()
    };
    Ok((report, layers))
}

pub async fn run_explore(engine: &EngineArgs, view: &ViewArgs) -> anyhow::Result<()> {
    let mut explorer = Explorer::new(engine.connect()?);
    let (report, layers) = render(&mut explorer, view).await?;

    print!("{}", output::format_report(&report, &layers));

    if let Some(path) = &view.json {
        output::write_json(path, &report)?;
        info!("Report written to {}", path);
    }
    if let Some(path) = &view.series_csv {
        match &report.series {
            Some(series) => {
                output::write_series_csv(path, series)?;
                info!("Series written to {}", path);
            }
            None => anyhow::bail!("no chart series to write; pass --chart-years and a known region"),
        }
    }
    Ok(())
}
