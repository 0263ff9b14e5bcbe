//! A settings root with optional lookup memoization.

use crate::memory::{MapMemory, SettingsMemory};
use crate::node::Node;
use crate::strings;
use std::ops::Deref;
use std::rc::Rc;

/// Owns the root map of a settings tree.
///
/// Exact path lookups go through the memory when one is installed; other
/// node operations are reachable through `Deref`.
pub struct Settings {
    root: Node,
}

impl Settings {
    pub fn new() -> Self {
        Self::from_node(Node::new_map())
    }

    /// Uses `root` as the tree. A non-map value is replaced by an empty map.
    pub fn from_node(root: Node) -> Self {
        if !root.is_map() {
            root.set_value(serde_json::Value::Object(serde_json::Map::new()));
        }
        Self { root }
    }

    pub fn with_memory(self, memory: Rc<dyn SettingsMemory>) -> Self {
        self.root.set_memory(Some(memory));
        self
    }

    pub fn with_map_memory(self) -> Self {
        self.with_memory(Rc::new(MapMemory::new()))
    }

    pub fn memory(&self) -> Option<Rc<dyn SettingsMemory>> {
        self.root.memory()
    }

    pub fn is_memorizing(&self) -> bool {
        self.memory().is_some()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn get(&self, key: &str) -> Node {
        self.get_path(&[key])
    }

    /// Exact path lookup, memoized under the dotted path.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Node {
        let Some(memory) = self.memory() else {
            return self.root.get_path(path);
        };
        let id = path
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(".");
        if let Some(node) = memory.get(&id) {
            return node;
        }
        let node = self.root.get_path(path);
        memory.save(&id, &node);
        node
    }

    pub fn get_split(&self, path: &str) -> Node {
        self.get_path(&strings::split_escaped(path, '.'))
    }

    /// Empties the tree and its memory.
    pub fn clear(&self) {
        self.root.clear();
        if let Some(memory) = self.memory() {
            memory.clear();
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Settings {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.root
    }
}

impl From<Node> for Settings {
    fn from(root: Node) -> Self {
        Self::from_node(root)
    }
}
