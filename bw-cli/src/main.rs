//! BloomWatch CLI - explore monthly vegetation indices from the command line.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "bw-cli",
    version,
    about = "BloomWatch vegetation index explorer"
)]
struct Cli {
    #[command(subcommand)]
    command: bw_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    bw_cmd::run(cli.command).await
}
