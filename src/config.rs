//! Engine configuration.
//!
//! Read from a YAML file given explicitly or through
//! `SETTINGS_TREE_CONFIG`, then overridden by environment variables:
//! - `SETTINGS_TREE_PARSER` - expression preset (`empty`, `simple`, `all`)
//! - `SETTINGS_TREE_MAX_DEPTH` - nesting limit for `$[...]` expressions

use crate::expr::{DEFAULT_MAX_DEPTH, SettingsParser};
use crate::loader::SettingsLoader;
use crate::update::SettingsUpdater;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const CONFIG_ENV: &str = "SETTINGS_TREE_CONFIG";
pub const PARSER_ENV: &str = "SETTINGS_TREE_PARSER";
pub const MAX_DEPTH_ENV: &str = "SETTINGS_TREE_MAX_DEPTH";

/// Which expression handlers a parser starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserPreset {
    /// No expressions are resolved
    Empty,
    /// Only `${path}` lookups
    Simple,
    /// Every built-in expression plus `extends` (default)
    #[default]
    All,
}

impl FromStr for ParserPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empty" | "none" => Ok(Self::Empty),
            "simple" => Ok(Self::Simple),
            "all" => Ok(Self::All),
            other => Err(format!(
                "Unknown parser preset '{}'. Valid options: empty, simple, all",
                other
            )),
        }
    }
}

impl fmt::Display for ParserPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Settings for the parser, updater and loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Expression preset (default: all).
    #[serde(default)]
    pub parser: ParserPreset,

    /// Limit on nested `$[...]` expressions (default: 32).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Fill keys missing from a loaded file using the defaults tree
    /// (default: true).
    #[serde(default = "default_reconcile")]
    pub reconcile: bool,

    /// Write a file back when loading it changed the tree (default: false).
    #[serde(default)]
    pub save_on_update: bool,

    /// Memoize exact path lookups (default: false).
    #[serde(default)]
    pub memoize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parser: ParserPreset::default(),
            max_depth: default_max_depth(),
            reconcile: default_reconcile(),
            save_on_update: false,
            memoize: false,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_reconcile() -> bool {
    true
}

impl EngineConfig {
    /// Loads from `path`, or from `SETTINGS_TREE_CONFIG`, or defaults;
    /// then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok();
        let path = path.or(env_path.as_deref().map(Path::new));

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Parses YAML; an empty or comment-only document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Option<Self> = serde_yaml::from_str(content)?;
        Ok(config.unwrap_or_default())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(preset) = std::env::var(PARSER_ENV) {
            self.parser = preset
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {PARSER_ENV}"))?;
        }
        if let Ok(depth) = std::env::var(MAX_DEPTH_ENV) {
            self.max_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("Invalid {MAX_DEPTH_ENV} '{depth}'"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        Ok(())
    }

    pub fn build_parser(&self) -> SettingsParser {
        let parser = match self.parser {
            ParserPreset::Empty => SettingsParser::empty(),
            ParserPreset::Simple => SettingsParser::simple(),
            ParserPreset::All => SettingsParser::all(),
        };
        parser.with_max_depth(self.max_depth)
    }

    pub fn build_updater(&self) -> SettingsUpdater {
        SettingsUpdater::new(Vec::new()).with_reconcile(self.reconcile)
    }

    pub fn build_loader(&self) -> SettingsLoader {
        SettingsLoader::new()
            .with_parser(self.build_parser())
            .with_updater(self.build_updater())
            .with_save_on_update(self.save_on_update)
            .with_memoize(self.memoize)
    }
}
