//! Text formats that settings trees are read from and written to.
//!
//! Each [`SettingsSource`] turns one text format into a map node and back.
//! The [`SourceRegistry`] picks a source by format id or file extension.

mod json;
mod toml;
mod yaml;

pub use self::json::JsonSource;
pub use self::toml::TomlSource;
pub use self::yaml::YamlSource;

use crate::error::SourceError;
use crate::node::Node;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// A text format for settings trees.
pub trait SettingsSource {
    /// Format id, such as `yaml`.
    fn format(&self) -> &'static str;

    /// File extensions handled by this source, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses `text` into a map node.
    fn read(&self, text: &str) -> Result<Node, SourceError>;

    /// Renders a tree, including comments when the format has them.
    fn write(&self, node: &Node) -> Result<String, SourceError>;

    /// Line comment marker, when the format supports comments.
    fn comment_prefix(&self) -> Option<&'static str> {
        None
    }

    /// Strips carriage returns, the comment marker and one following space
    /// from each line.
    fn read_comment(&self, lines: &[&str]) -> Vec<String> {
        let Some(prefix) = self.comment_prefix() else {
            return Vec::new();
        };
        lines
            .iter()
            .map(|line| {
                let line = line.trim_end_matches('\r').trim_start();
                let line = line.strip_prefix(prefix).unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line).to_string()
            })
            .collect()
    }

    /// Renders comment lines at `indent`, one marker per line.
    fn write_comment(&self, lines: &[String], indent: usize) -> String {
        let Some(prefix) = self.comment_prefix() else {
            return String::new();
        };
        let pad = " ".repeat(indent);
        lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    format!("{pad}{prefix}\n")
                } else {
                    format!("{pad}{prefix} {line}\n")
                }
            })
            .collect()
    }
}

/// Sources by format id and file extension.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: IndexMap<String, Rc<dyn SettingsSource>>,
    extensions: HashMap<String, String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON, YAML and TOML.
    pub fn standard() -> Self {
        Self::new()
            .with_source(JsonSource)
            .with_source(YamlSource)
            .with_source(TomlSource)
    }

    pub fn with_source(mut self, source: impl SettingsSource + 'static) -> Self {
        self.register(source);
        self
    }

    /// Adds `source`, replacing any source with the same format id.
    pub fn register(&mut self, source: impl SettingsSource + 'static) {
        let format = source.format().to_string();
        for ext in source.extensions() {
            self.extensions.insert(ext.to_lowercase(), format.clone());
        }
        debug!(format = %format, "Registered settings source");
        self.sources.insert(format, Rc::new(source));
    }

    pub fn get(&self, format: &str) -> Option<Rc<dyn SettingsSource>> {
        self.sources.get(&format.to_lowercase()).cloned()
    }

    pub fn for_extension(&self, ext: &str) -> Option<Rc<dyn SettingsSource>> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extensions.get(&ext).and_then(|format| self.get(format))
    }

    pub fn for_path(&self, path: &Path) -> Option<Rc<dyn SettingsSource>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.for_extension(ext))
    }

    pub fn formats(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }
}

/// Describes a raw value for error messages.
pub(crate) fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "map",
    }
}

/// Wraps a parsed document, which must be a map. An empty document reads
/// as an empty map.
pub(crate) fn document_root(value: serde_json::Value) -> Result<Node, SourceError> {
    match value {
        serde_json::Value::Object(_) => Ok(Node::wrap(value)),
        serde_json::Value::Null => Ok(Node::new_map()),
        other => Err(SourceError::NotAMap(kind_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_extension() {
        let registry = SourceRegistry::standard();
        assert_eq!(registry.for_extension("yml").map(|s| s.format()), Some("yaml"));
        assert_eq!(registry.for_extension(".JSON").map(|s| s.format()), Some("json"));
        assert_eq!(
            registry.for_path(Path::new("conf/app.toml")).map(|s| s.format()),
            Some("toml")
        );
        assert!(registry.for_path(Path::new("README")).is_none());
        assert_eq!(registry.formats(), vec!["json", "yaml", "toml"]);
    }

    #[test]
    fn test_comment_helpers() {
        let yaml = YamlSource;
        assert_eq!(yaml.read_comment(&["# one", "  #two"]), vec!["one", "two"]);
        assert_eq!(yaml.write_comment(&["a".into(), String::new()], 2), "  # a\n  #\n");
        assert!(JsonSource.read_comment(&["# x"]).is_empty());
    }
}
