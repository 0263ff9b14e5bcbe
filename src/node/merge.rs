//! Merging one map node into another.
//!
//! Keys missing from the target are always inserted. Keys present in both
//! are left alone unless `replace` is set, or both sides are maps and `deep`
//! is set, in which case the merge recurses. Lists and scalars are never
//! combined, only replaced.

use super::Node;
use serde_json::Value;

/// Flags controlling [`Node::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Overwrite keys that already exist in the target.
    pub replace: bool,
    /// Recurse when both sides hold a map at the same key.
    pub deep: bool,
    /// Move inserted children out of the source instead of copying them.
    pub append: bool,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }
}

impl Node {
    /// Merges the children of `source` into this map.
    ///
    /// Replaced nodes hand their comments to the new node when it has none.
    /// Returns whether any key was inserted or any value changed.
    pub fn merge(&self, source: &Node, options: MergeOptions) -> bool {
        if !source.is_map() || self.ptr_eq(source) {
            return false;
        }
        if self.is_empty() {
            self.ensure_map();
        } else if !self.is_map() {
            return false;
        }

        let mut changed = false;
        for (key, incoming) in source.entries() {
            match self.child(&key) {
                None => {
                    let node = if options.append {
                        source.remove(&key);
                        incoming
                    } else {
                        incoming.copy()
                    };
                    self.put(key, node);
                    changed = true;
                }
                Some(existing) if options.deep && existing.is_map() && incoming.is_map() => {
                    changed |= existing.merge(&incoming, options);
                }
                Some(existing) if options.replace => {
                    let node = incoming.copy();
                    node.merge_comment(&existing);
                    changed |= existing.value() != node.value();
                    self.put(key, node);
                }
                Some(_) => {}
            }
        }
        changed
    }

    /// Merges a raw map value; see [`Node::merge`].
    pub fn merge_value(&self, source: impl Into<Value>, options: MergeOptions) -> bool {
        let source = Node::wrap(source);
        self.merge(&source, options.with_append(true))
    }

    /// Recursive merge, overwriting existing keys when `replace` is set.
    pub fn deep_merge(&self, source: &Node, replace: bool) -> bool {
        self.merge(
            source,
            MergeOptions::new().with_deep(true).with_replace(replace),
        )
    }
}
