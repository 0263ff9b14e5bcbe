//! Memoization of path lookups.
//!
//! A memory lives on the root node. Structural edits below the root report
//! the changed path so stale entries for that path and everything beneath
//! it are dropped.

use crate::node::Node;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::trace;

/// Store of previously resolved lookups, keyed by dotted path.
pub trait SettingsMemory {
    fn get(&self, id: &str) -> Option<Node>;

    fn save(&self, id: &str, node: &Node);

    /// Forgets `id` and every id below it.
    fn remove(&self, id: &str);

    /// Forgets every entry holding `node`.
    fn remove_node(&self, node: &Node);

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash map backed memory.
#[derive(Default)]
pub struct MapMemory {
    entries: RefCell<HashMap<String, Node>>,
}

impl MapMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsMemory for MapMemory {
    fn get(&self, id: &str) -> Option<Node> {
        self.entries.borrow().get(id).cloned()
    }

    fn save(&self, id: &str, node: &Node) {
        self.entries.borrow_mut().insert(id.to_string(), node.clone());
    }

    fn remove(&self, id: &str) {
        let prefix = format!("{id}.");
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|key, _| key != id && !key.starts_with(&prefix));
        if entries.len() != before {
            trace!(id, dropped = before - entries.len(), "Invalidated memoized lookups");
        }
    }

    fn remove_node(&self, node: &Node) {
        self.entries
            .borrow_mut()
            .retain(|_, cached| !cached.ptr_eq(node));
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_drops_descendants() {
        let memory = MapMemory::new();
        let node = Node::empty();
        memory.save("a", &node);
        memory.save("a.b", &node);
        memory.save("ab", &node);
        memory.remove("a");
        assert!(memory.get("a").is_none());
        assert!(memory.get("a.b").is_none());
        assert!(memory.get("ab").is_some());
    }

    #[test]
    fn test_remove_node_by_identity() {
        let memory = MapMemory::new();
        let a = Node::wrap(1);
        let b = Node::wrap(1);
        memory.save("x", &a);
        memory.save("y", &b);
        memory.remove_node(&a);
        assert_eq!(memory.len(), 1);
        assert!(memory.get("y").is_some_and(|n| n.ptr_eq(&b)));
    }
}
