//! PageGrid command-line tool.
//!
//! Usage:
//!   pagegrid migrate --source legacy.json [--dry-run] [--force]
//!   pagegrid show --owner home [--mode render] [--assets assets.json]
//!   pagegrid schema
//!   pagegrid blueprint

use anyhow::Result;
use clap::Parser;
use pagegrid_cli::{Cli, execute};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let output = execute(&cli)?;
    println!("{output}");
    Ok(())
}
