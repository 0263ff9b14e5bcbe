//! Resolve command: reconciles a file with defaults, resolves templates
//! and prints the tree.

use super::{OutputFormat, load};
use crate::loader::SettingsLoader;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the resolve command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Settings file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Defaults file used to fill missing keys
    #[arg(short, long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Output format (default: the input file's format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

pub fn run_resolve(loader: &SettingsLoader, args: &ResolveArgs) -> Result<String> {
    let loaded = load(loader, &args.file, args.defaults.as_deref())?;
    let format = match args.format {
        Some(format) => format.id(),
        None => loader
            .sources()
            .for_path(&args.file)
            .map(|source| source.format())
            .unwrap_or(OutputFormat::default().id()),
    };
    Ok(loader.save_str(format, loaded.root())?)
}
