mod analysis;
mod cli;
mod config;
mod engine;
mod error;
mod output;
mod workflow;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting DagLens - CI/CD Dependency Graph Analyzer");
    cli.execute()?;

    Ok(())
}
