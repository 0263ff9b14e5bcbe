//! Reads settings files into resolved trees.
//!
//! Loading runs in three steps: the text is read through the matching
//! [`SettingsSource`](crate::source::SettingsSource), the tree is brought up
//! to date against an optional defaults tree, and templates are resolved.
//! With `save_on_update` a file that changed during the update step is
//! written back before templates are resolved, so `${...}` placeholders are
//! kept on disk.

use crate::error::{Result, SettingsError};
use crate::expr::SettingsParser;
use crate::node::Node;
use crate::settings::Settings;
use crate::source::{SettingsSource, SourceRegistry};
use crate::update::SettingsUpdater;
use std::io::ErrorKind;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// A loaded tree and whether updating it changed anything.
pub struct Loaded {
    pub settings: Settings,
    pub changed: bool,
}

impl Loaded {
    pub fn root(&self) -> &Node {
        self.settings.root()
    }
}

pub struct SettingsLoader {
    sources: SourceRegistry,
    parser: SettingsParser,
    updater: SettingsUpdater,
    save_on_update: bool,
    memoize: bool,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Standard sources, every expression handler and a reconciling updater.
    pub fn new() -> Self {
        Self {
            sources: SourceRegistry::standard(),
            parser: SettingsParser::all(),
            updater: SettingsUpdater::simple(),
            save_on_update: false,
            memoize: false,
        }
    }

    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_parser(mut self, parser: SettingsParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_updater(mut self, updater: SettingsUpdater) -> Self {
        self.updater = updater;
        self
    }

    pub fn with_save_on_update(mut self, save_on_update: bool) -> Self {
        self.save_on_update = save_on_update;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn parser(&self) -> &SettingsParser {
        &self.parser
    }

    fn source(&self, format: &str) -> Result<Rc<dyn SettingsSource>> {
        self.sources
            .get(format)
            .ok_or_else(|| SettingsError::UnknownFormat(format.to_string()))
    }

    fn source_for_path(&self, path: &Path) -> Result<Rc<dyn SettingsSource>> {
        self.sources.for_path(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            SettingsError::UnknownFormat(ext)
        })
    }

    /// Parses `text` without updating or resolving it.
    pub fn read_str(&self, format: &str, text: &str) -> Result<Node> {
        Ok(self.source(format)?.read(text)?)
    }

    /// Reads a file without updating or resolving it. A missing file reads
    /// as an empty map.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Node> {
        let path = path.as_ref();
        let source = self.source_for_path(path)?;
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(source.read(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file not found, starting empty");
                Ok(Node::new_map())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn load_str(&self, format: &str, text: &str, defaults: Option<&Node>) -> Result<Loaded> {
        let root = self.read_str(format, text)?;
        let changed = self.updater.update(&root, defaults);
        self.finish(root, changed)
    }

    pub fn load_file(&self, path: impl AsRef<Path>, defaults: Option<&Node>) -> Result<Loaded> {
        let path = path.as_ref();
        let root = self.read_file(path)?;
        let changed = self.updater.update(&root, defaults);
        if changed && self.save_on_update {
            self.save_file(path, &root)?;
            info!(path = %path.display(), "Saved updated settings");
        }
        self.finish(root, changed)
    }

    fn finish(&self, root: Node, changed: bool) -> Result<Loaded> {
        self.parser.parse(&root)?;
        let mut settings = Settings::from_node(root);
        if self.memoize {
            settings = settings.with_map_memory();
        }
        Ok(Loaded { settings, changed })
    }

    pub fn save_str(&self, format: &str, node: &Node) -> Result<String> {
        Ok(self.source(format)?.write(node)?)
    }

    /// Writes `node` through the source matching the file extension,
    /// creating parent directories as needed.
    pub fn save_file(&self, path: impl AsRef<Path>, node: &Node) -> Result<()> {
        let path = path.as_ref();
        let text = self.source_for_path(path)?.write(node)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "Wrote settings file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_str_reconciles_and_resolves() {
        let defaults = Node::wrap(json!({"port": 80, "url": "http://host:${port}"}));
        let loaded = SettingsLoader::new()
            .load_str("json", r#"{"port": 8080}"#, Some(&defaults))
            .unwrap();
        assert!(loaded.changed);
        assert_eq!(loaded.root().get("url").value(), json!("http://host:8080"));
    }

    #[test]
    fn test_unknown_format() {
        let loader = SettingsLoader::new();
        assert!(matches!(
            loader.load_str("ini", "", None),
            Err(SettingsError::UnknownFormat(f)) if f == "ini"
        ));
        assert!(matches!(
            loader.read_file("settings.ini"),
            Err(SettingsError::UnknownFormat(f)) if f == "ini"
        ));
    }

    #[test]
    fn test_source_errors_propagate() {
        assert!(matches!(
            SettingsLoader::new().load_str("json", "{", None),
            Err(SettingsError::Source(_))
        ));
    }

    #[test]
    fn test_memoize_installs_memory() {
        let loaded = SettingsLoader::new()
            .with_memoize(true)
            .load_str("yaml", "a: 1\n", None)
            .unwrap();
        assert!(loaded.settings.is_memorizing());
        assert!(!loaded.changed);
    }

    #[test]
    fn test_save_str() {
        let node = Node::wrap(json!({"a": {"b": true}}));
        let text = SettingsLoader::new().save_str("toml", &node).unwrap();
        assert_eq!(text, "[a]\nb = true\n");
    }
}
