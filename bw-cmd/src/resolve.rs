//! The `resolve` subcommand.

use bw_data::region::{Region, RegionStatus};

use crate::EngineArgs;

pub fn describe(region: &Region) -> String {
    match (region.status(), region.boundary().bounds()) {
        (RegionStatus::Found, Some(b)) => format!(
            "{}: found, bounds W {:.4} S {:.4} E {:.4} N {:.4}",
            region.name(),
            b.west,
            b.south,
            b.east,
            b.north
        ),
        (RegionStatus::Found, None) => format!("{}: found, empty boundary", region.name()),
        (RegionStatus::FallbackGlobal(cause), _) => {
            format!("{}: not resolved ({:?}), global view", region.name(), cause)
        }
    }
}

pub async fn run_resolve(engine: &EngineArgs, name: &str) -> anyhow::Result<()> {
    let explorer = bw_data::Explorer::new(engine.connect()?);
    let region = explorer.resolve_region(name).await;
    println!("{}", describe(&region));
    if region.is_found() {
        println!("{}", serde_json::to_string(region.boundary())?);
    }
    Ok(())
}
