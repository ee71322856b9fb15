//! Command implementations for the BloomWatch CLI.
//!
//! Provides subcommands for rendering a dashboard view, building a yearly
//! index series and resolving region names against Earth Engine.

use clap::{Args, Subcommand};
use std::time::Duration;

use bw_gee::client::{EngineOptions, RestEngine, DEFAULT_ENDPOINT};
use bw_gee::index::IndexKind;
use bw_utils::months::parse_month;
use bw_utils::years::parse_year_range;

pub mod explore;
pub mod output;
pub mod resolve;
pub mod series;

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Earth Engine cloud project
    #[arg(long, env = "EE_PROJECT")]
    pub project: String,

    /// OAuth access token (e.g. `gcloud auth print-access-token`)
    #[arg(long, env = "EE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Earth Engine API endpoint
    #[arg(long, env = "EE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

impl EngineArgs {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            project: self.project.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..EngineOptions::default()
        }
    }

    pub fn connect(&self) -> anyhow::Result<RestEngine> {
        Ok(RestEngine::new(self.options(), self.token.clone())?)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Render one dashboard view: composite, optional anomaly and chart
    Explore {
        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        view: explore::ViewArgs,
    },

    /// Yearly regional mean of an index for one month
    Series {
        #[command(flatten)]
        engine: EngineArgs,

        /// Region (country) name, exact match
        #[arg(short, long)]
        region: String,

        /// Month as number or name
        #[arg(short, long, value_parser = parse_month)]
        month: u32,

        /// Inclusive year span, e.g. 2018-2024
        #[arg(short, long, value_parser = parse_year_range)]
        years: (i32, i32),

        /// Vegetation index (NDVI or EVI)
        #[arg(short, long, default_value = "NDVI")]
        index: IndexKind,

        /// Reduction scale in meters per pixel
        #[arg(long, default_value_t = bw_gee::engine::DEFAULT_SCALE)]
        scale: u32,

        /// Output path for the series CSV (stdout if omitted)
        #[arg(short, long)]
        csv: Option<String>,
    },

    /// Resolve a region name to its boundary
    Resolve {
        #[command(flatten)]
        engine: EngineArgs,

        /// Region (country) name, exact match
        region: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Explore { engine, view } => explore::run_explore(&engine, &view).await,
        Command::Series {
            engine,
            region,
            month,
            years,
            index,
            scale,
            csv,
        } => {
            series::run_series(&engine, &region, month, years, index, scale, csv.as_deref()).await
        }
        Command::Resolve { engine, region } => resolve::run_resolve(&engine, &region).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn test_parse_series_command() {
        let cli = TestCli::try_parse_from([
            "bw-cli", "series", "--project", "demo", "--token", "t", "-r", "Pakistan", "-m",
            "May", "-y", "2018-2024",
        ])
        .unwrap();
        match cli.command {
            Command::Series {
                engine,
                region,
                month,
                years,
                index,
                scale,
                csv,
            } => {
                assert_eq!(engine.project, "demo");
                assert_eq!(engine.endpoint, DEFAULT_ENDPOINT);
                assert_eq!(region, "Pakistan");
                assert_eq!(month, 5);
                assert_eq!(years, (2018, 2024));
                assert_eq!(index, IndexKind::Ndvi);
                assert_eq!(scale, 250);
                assert!(csv.is_none());
            }
            _ => panic!("expected series command"),
        }
    }

    #[test]
    fn test_bad_month_is_rejected() {
        let result = TestCli::try_parse_from([
            "bw-cli", "series", "--project", "demo", "--token", "t", "-r", "Pakistan", "-m",
            "Smarch", "-y", "2020",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_engine_options() {
        let args = EngineArgs {
            project: "demo".into(),
            token: "t".into(),
            endpoint: "http://localhost:8080/".into(),
            timeout_secs: 5,
        };
        let options = args.options();
        assert_eq!(options.endpoint, "http://localhost:8080");
        assert_eq!(options.request_timeout, Duration::from_secs(5));
        assert_eq!(options.project, "demo");
    }
}
