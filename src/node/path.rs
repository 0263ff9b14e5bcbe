//! Child access, path lookups and structural edits.

use super::{Content, Node};
use crate::strings;
use regex_lite::Regex;
use serde_json::{Map, Value};
use tracing::warn;

impl Node {
    /// The existing child at `key`, if this is a map that has one.
    pub fn child(&self, key: &str) -> Option<Node> {
        match self.0.borrow().content() {
            Some(Content::Map(children)) => children.get(key).cloned(),
            _ => None,
        }
    }

    fn find_child(&self, matches: impl Fn(&str) -> bool) -> Option<Node> {
        match self.0.borrow().content() {
            Some(Content::Map(children)) => children
                .iter()
                .find(|(key, _)| matches(key))
                .map(|(_, child)| child.clone()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.child(key).is_some()
    }

    /// Keys of a map in insertion order.
    pub fn keys(&self) -> Vec<String> {
        match self.0.borrow().content() {
            Some(Content::Map(children)) => children.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Key and child pairs of a map in insertion order.
    pub fn entries(&self) -> Vec<(String, Node)> {
        match self.0.borrow().content() {
            Some(Content::Map(children)) => children
                .iter()
                .map(|(k, c)| (k.clone(), c.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Children of a map or elements of a list.
    pub fn children(&self) -> Vec<Node> {
        self.0
            .borrow()
            .content()
            .map(Content::children)
            .unwrap_or_default()
    }

    /// Elements of a list.
    pub fn elements(&self) -> Vec<Node> {
        match self.0.borrow().content() {
            Some(Content::List(elements)) => elements.clone(),
            _ => Vec::new(),
        }
    }

    pub fn element(&self, index: usize) -> Option<Node> {
        match self.0.borrow().content() {
            Some(Content::List(elements)) => elements.get(index).cloned(),
            _ => None,
        }
    }

    /// The child at `key`, or a placeholder that attaches on first write.
    ///
    /// On a non-map the placeholder is keyless and never attaches.
    pub fn get(&self, key: &str) -> Node {
        if let Some(child) = self.child(key) {
            return child;
        }
        if self.is_map() {
            Node::placeholder(self, Some(key.to_string()))
        } else {
            Node::placeholder(self, None)
        }
    }

    /// Walks `path` by exact key.
    ///
    /// Missing segments produce unattached intermediate maps ending in a
    /// keyed placeholder, so writing to the result creates the whole path.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Node {
        self.lookup(path, |candidate, wanted| candidate == wanted)
    }

    /// Like [`Node::get`] with case-insensitive key matching.
    pub fn get_ignore_case(&self, key: &str) -> Node {
        self.get_ignore_case_path(&[key])
    }

    /// Like [`Node::get_path`] with case-insensitive key matching.
    pub fn get_ignore_case_path<S: AsRef<str>>(&self, path: &[S]) -> Node {
        self.lookup(path, |candidate, wanted| {
            candidate == wanted || candidate.to_lowercase() == wanted.to_lowercase()
        })
    }

    /// Walks a dotted path; `\.` is a literal dot inside a key.
    pub fn get_split(&self, path: &str) -> Node {
        self.get_path(&strings::split_escaped(path, '.'))
    }

    fn lookup<S: AsRef<str>>(&self, path: &[S], matches: impl Fn(&str, &str) -> bool) -> Node {
        let mut node = self.clone();
        for (i, segment) in path.iter().enumerate() {
            let segment = segment.as_ref();
            if !node.is_map() {
                return Node::placeholder(self, None);
            }
            match node.find_child(|key| matches(key, segment)) {
                Some(child) => node = child,
                None => {
                    let last = path.len() - 1;
                    for key in &path[i..last] {
                        node = Node::detached_map(&node, key.as_ref());
                    }
                    return Node::placeholder(&node, Some(path[last].as_ref().to_string()));
                }
            }
        }
        node
    }

    /// Finds the first child whose key fully matches `pattern`.
    pub fn get_regex(&self, pattern: &str) -> Node {
        self.get_regex_path(&[pattern])
    }

    /// Walks `patterns`, each matched against the whole key.
    ///
    /// Misses (and invalid patterns) return a keyless placeholder.
    pub fn get_regex_path<S: AsRef<str>>(&self, patterns: &[S]) -> Node {
        let mut node = self.clone();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(regex) => regex,
                Err(e) => {
                    warn!(pattern, error = %e, "Invalid key pattern");
                    return Node::placeholder(self, None);
                }
            };
            match node.find_child(|key| regex.is_match(key)) {
                Some(child) => node = child,
                None => return Node::placeholder(self, None),
            }
        }
        node
    }

    // --- structure ------------------------------------------------------

    /// Turns this node into an empty map unless it already is one.
    pub(crate) fn ensure_map(&self) {
        if !self.is_map() {
            self.set_value(Value::Object(Map::new()));
        }
    }

    /// Inserts `node` at `key`, re-parenting it. Returns the displaced child.
    ///
    /// Replacing an existing key keeps its position.
    pub fn put(&self, key: impl Into<String>, node: Node) -> Option<Node> {
        let key = key.into();
        self.ensure_map();
        node.link(self, &key);
        let old = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            match data.content_mut() {
                Some(Content::Map(children)) => children.insert(key.clone(), node.clone()),
                _ => None,
            }
        };
        let old = old.filter(|old| !old.ptr_eq(&node));
        if let Some(old) = &old {
            old.unlink();
        }
        self.notify_changed(Some(&key), old.as_ref());
        old
    }

    /// Inserts a raw value at `key`.
    pub fn put_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Node {
        let node = Node::wrap(value);
        self.put(key, node.clone());
        node
    }

    /// Appends an element to a list, turning an empty node into a list.
    pub fn push(&self, node: Node) -> &Self {
        if self.is_empty() {
            self.set_value(Value::Array(Vec::new()));
        }
        {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            if let Some(Content::List(elements)) = data.content_mut() {
                node.link_element(self);
                elements.push(node);
            }
        }
        self.notify_changed(None, None);
        self
    }

    pub(crate) fn replace_elements(&self, elements: Vec<Node>) {
        for element in &elements {
            element.link_element(self);
        }
        let dropped = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            match data.content_mut() {
                Some(Content::List(current)) => std::mem::replace(current, elements),
                _ => Vec::new(),
            }
        };
        for old in dropped {
            if !self.elements().iter().any(|e| e.ptr_eq(&old)) {
                old.unlink();
            }
        }
        self.notify_changed(None, None);
    }

    /// Removes the child at `key`.
    pub fn remove(&self, key: &str) -> Option<Node> {
        let removed = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            match data.content_mut() {
                Some(Content::Map(children)) => children.shift_remove(key),
                _ => None,
            }
        };
        if let Some(node) = &removed {
            node.unlink();
            self.notify_changed(Some(key), Some(node));
        }
        removed
    }

    /// Removes the child at `key`, then prunes this map from its parent
    /// (recursively) if that left it empty.
    pub fn remove_deep(&self, key: &str) -> Option<Node> {
        let removed = self.remove(key);
        if removed.is_some() {
            self.prune_if_empty();
        }
        removed
    }

    fn prune_if_empty(&self) {
        if !self.is_map() || self.len() > 0 || !self.is_attached() {
            return;
        }
        if let (Some(parent), Some(key)) = (self.parent(), self.key()) {
            parent.remove_deep(&key);
        }
    }

    /// Removes every child matching `predicate`; returns whether any were.
    pub fn remove_if(&self, predicate: impl Fn(&str, &Node) -> bool, deep: bool) -> bool {
        let doomed: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|(key, child)| predicate(key, child))
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        if deep && !doomed.is_empty() {
            self.prune_if_empty();
        }
        !doomed.is_empty()
    }

    /// Drops all children of a map or list.
    pub fn clear(&self) -> &Self {
        let dropped = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            match data.content_mut() {
                Some(Content::Map(children)) => children.drain(..).map(|(_, c)| c).collect(),
                Some(Content::List(elements)) => std::mem::take(elements),
                _ => Vec::new(),
            }
        };
        for child in &dropped {
            child.unlink();
        }
        self.notify_changed(None, None);
        self
    }

    /// Whether the parent map currently holds this exact node.
    pub fn is_attached(&self) -> bool {
        match (self.parent(), self.key()) {
            (Some(parent), Some(key)) => parent.child(&key).is_some_and(|c| c.ptr_eq(self)),
            _ => false,
        }
    }

    /// Inserts a placeholder (and its unattached ancestors) into the tree.
    pub(crate) fn attach(&self) {
        let (Some(parent), Some(key)) = (self.parent(), self.key()) else {
            return;
        };
        if parent.is_list() || parent.child(&key).is_some_and(|c| c.ptr_eq(self)) {
            return;
        }
        parent.attach();
        parent.put(key, self.clone());
    }

    /// Detaches this node from its parent, optionally pruning maps left
    /// empty. Returns whether the node was attached.
    pub fn delete(&self, deep: bool) -> bool {
        if !self.is_attached() {
            return false;
        }
        let (Some(parent), Some(key)) = (self.parent(), self.key()) else {
            return false;
        };
        if deep {
            parent.remove_deep(&key);
        } else {
            parent.remove(&key);
        }
        true
    }

    /// Moves this node to `path`, measured from the root of its tree.
    ///
    /// The node is removed from its current parent (pruning emptied maps)
    /// and inserted at the destination, keeping its identity. A node
    /// without a parent is only renamed to the last segment.
    pub fn move_to<S: AsRef<str>>(&self, path: &[S]) -> &Self {
        let Some(last) = path.last() else {
            return self;
        };
        if self.parent().is_none() {
            return self.set_key(Some(last.as_ref().to_string()));
        }
        let root = self.root();
        if self.is_attached() {
            if let (Some(parent), Some(key)) = (self.parent(), self.key()) {
                parent.remove_deep(&key);
            }
        }
        root.set(self.clone(), path);
        self
    }

    /// Places `node` at `path` below this node, creating intermediate maps.
    ///
    /// A non-map found on the way is replaced by a map that inherits its
    /// comments.
    pub fn set<S: AsRef<str>>(&self, node: Node, path: &[S]) -> &Self {
        let Some((last, intermediate)) = path.split_last() else {
            return self;
        };
        let mut map = self.clone();
        for key in intermediate {
            let key = key.as_ref();
            map = match map.child(key) {
                Some(child) if child.is_map() => child,
                Some(child) => {
                    let replacement = Node::new_map();
                    replacement.merge_comment(&child);
                    map.put(key, replacement.clone());
                    replacement
                }
                None => {
                    let created = Node::new_map();
                    map.put(key, created.clone());
                    created
                }
            };
        }
        map.put(last.as_ref(), node);
        self
    }

    /// Every leaf path below this map; nested maps are expanded, lists and
    /// scalars are leaves.
    pub fn paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        for (key, child) in self.entries() {
            if child.is_map() {
                for mut rest in child.paths() {
                    rest.insert(0, key.clone());
                    paths.push(rest);
                }
            } else {
                paths.push(vec![key]);
            }
        }
        paths
    }

    /// Keys from the root down to this node, or `None` when an ancestor
    /// below the root has no key.
    pub fn key_path(&self) -> Option<Vec<String>> {
        let mut keys = Vec::new();
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            keys.push(node.key()?);
            node = parent;
        }
        keys.reverse();
        Some(keys)
    }

    /// Records that the subtree at this node (or at its child `key`)
    /// changed.
    ///
    /// Every ancestor drops its typed cache. The root's memory forgets the
    /// changed path; below a list element that is the path of the list.
    pub(crate) fn notify_changed(&self, key: Option<&str>, detached: Option<&Node>) {
        let mut path = Vec::new();
        let mut exact = true;
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            parent.0.borrow_mut().cache = None;
            match node.key() {
                Some(key) => path.push(key),
                None => {
                    path.clear();
                    exact = false;
                }
            }
            node = parent;
        }
        let Some(memory) = node.memory() else {
            return;
        };
        path.reverse();
        if exact {
            path.extend(key.map(str::to_string));
        }
        if path.is_empty() {
            memory.clear();
        } else {
            memory.remove(&path.join("."));
        }
        if let Some(node) = detached {
            memory.remove_node(node);
        }
    }
}
