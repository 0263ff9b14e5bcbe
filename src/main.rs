//! settings-tree command line.

use anyhow::{Context, Result};
use clap::Parser;
use settings_tree::cli::{self, Cli};
use settings_tree::config::EngineConfig;
use settings_tree::logging::{self, LogOutput};
use std::path::Path;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogOutput::parse(&cli.log), cli.verbose)?;

    let config = EngineConfig::load(cli.config.as_deref().map(Path::new))
        .context("Failed to load engine configuration")?;
    debug!(parser = %config.parser, max_depth = config.max_depth, "Engine configured");

    let loader = config.build_loader();
    let output = cli::run(&loader, &cli.command)?;
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}
