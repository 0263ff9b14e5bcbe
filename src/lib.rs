//! Hierarchical settings trees.
//!
//! A [`Node`] tree keeps source and override values plus comments for every
//! entry. On top of it sit typed coercion ([`types`]), `${...}` templates
//! ([`expr`]), declarative migrations ([`update`]), optional lookup
//! memoization ([`Settings`]) and JSON/YAML/TOML sources ([`source`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod loader;
pub mod logging;
pub mod memory;
pub mod node;
pub mod settings;
pub mod source;
pub mod strings;
pub mod types;
pub mod update;

pub use error::{Result, SettingsError, SourceError, TypeError};
pub use expr::{ExpressionHandler, NodeParser, SettingsParser};
pub use loader::{Loaded, SettingsLoader};
pub use memory::{MapMemory, SettingsMemory};
pub use node::{MergeOptions, Node, NodeKind};
pub use settings::Settings;
pub use source::{SettingsSource, SourceRegistry};
pub use types::{TypeParser, TypeRegistry};
pub use update::{NodeSelector, NodeUpdate, SettingsUpdater, UpdateAction, UpdateRules};
