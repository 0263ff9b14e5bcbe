//! CLI command definitions for settings-tree
//!
//! This module defines the CLI structure using clap's derive macros.
//! Every subcommand loads a settings file through a [`SettingsLoader`]
//! built from the engine config and renders its output as a string.

pub mod get;
pub mod paths;
pub mod resolve;

use crate::loader::{Loaded, SettingsLoader};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use get::GetArgs;
use paths::PathsArgs;
use resolve::ResolveArgs;
use std::fmt;
use std::path::Path;

/// Output format for rendered trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// YAML with comments
    Yaml,
    /// TOML tables
    Toml,
}

impl OutputFormat {
    pub fn id(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Inspect and resolve layered settings files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to engine configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a dotted path
    Get(GetArgs),

    /// List every leaf path in a settings file
    Paths(PathsArgs),

    /// Reconcile a file with defaults, resolve templates and print the result
    Resolve(ResolveArgs),
}

/// Loads `file`, filling missing keys from `defaults` when given.
pub(crate) fn load(
    loader: &SettingsLoader,
    file: &Path,
    defaults: Option<&Path>,
) -> Result<Loaded> {
    let defaults = defaults
        .map(|path| {
            loader
                .read_file(path)
                .with_context(|| format!("Failed to read defaults {}", path.display()))
        })
        .transpose()?;
    loader
        .load_file(file, defaults.as_ref())
        .with_context(|| format!("Failed to load {}", file.display()))
}

/// Runs a subcommand and returns its output.
pub fn run(loader: &SettingsLoader, command: &Command) -> Result<String> {
    match command {
        Command::Get(args) => get::run_get(loader, args),
        Command::Paths(args) => paths::run_paths(loader, args),
        Command::Resolve(args) => resolve::run_resolve(loader, args),
    }
}
