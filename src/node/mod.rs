//! The settings tree node.
//!
//! A [`Node`] is a shared handle to one position in the tree. It holds a
//! *source* value (as loaded) and an optional *face* value (an in-memory
//! override); reads see the face when present and fall back to the source.
//! The value is one of a map of keyed children, a list of children or a raw
//! scalar, and can change variant in place without changing the node's
//! identity.
//!
//! Missing lookups return *placeholders*: nodes that know their would-be
//! parent and key but are not part of the tree. Setting a value on a
//! placeholder attaches it (and any missing intermediate maps) to the tree.

mod edit;
mod merge;
mod path;

pub use merge::MergeOptions;

use crate::memory::SettingsMemory;
use crate::strings;
use crate::types::{CollectionKind, ParserId};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// The variant of a node's effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Map,
    List,
    Scalar,
}

pub(crate) enum Content {
    Map(IndexMap<String, Node>),
    List(Vec<Node>),
    Scalar(Value),
}

impl Content {
    fn kind(&self) -> NodeKind {
        match self {
            Content::Map(_) => NodeKind::Map,
            Content::List(_) => NodeKind::List,
            Content::Scalar(_) => NodeKind::Scalar,
        }
    }

    fn literal(&self) -> Value {
        match self {
            Content::Map(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, child)| (k.clone(), child.value()))
                    .collect(),
            ),
            Content::List(elements) => Value::Array(elements.iter().map(Node::value).collect()),
            Content::Scalar(value) => value.clone(),
        }
    }

    fn children(&self) -> Vec<Node> {
        match self {
            Content::Map(children) => children.values().cloned().collect(),
            Content::List(elements) => elements.clone(),
            Content::Scalar(_) => Vec::new(),
        }
    }
}

/// Last typed conversion of a node, keyed by the parser that produced it.
pub(crate) struct ParsedCache {
    parser: ParserId,
    collection: Option<CollectionKind>,
    value: Rc<dyn Any>,
}

pub(crate) struct NodeData {
    key: Option<String>,
    parent: Weak<RefCell<NodeData>>,
    source: Option<Content>,
    face: Option<Content>,
    top_comment: Option<Vec<String>>,
    side_comment: Option<Vec<String>>,
    cache: Option<ParsedCache>,
    /// Only set on a root node.
    memory: Option<Rc<dyn SettingsMemory>>,
}

impl NodeData {
    fn new(key: Option<String>, parent: Weak<RefCell<NodeData>>) -> Self {
        Self {
            key,
            parent,
            source: None,
            face: None,
            top_comment: None,
            side_comment: None,
            cache: None,
            memory: None,
        }
    }

    fn content(&self) -> Option<&Content> {
        self.face.as_ref().or(self.source.as_ref())
    }

    fn content_mut(&mut self) -> Option<&mut Content> {
        if self.face.is_some() {
            self.face.as_mut()
        } else {
            self.source.as_mut()
        }
    }
}

/// Shared handle to a settings tree node.
///
/// Cloning a `Node` clones the handle, not the subtree; use [`Node::copy`]
/// for a detached deep copy. Equality compares literal values.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    fn from_data(data: NodeData) -> Self {
        Node(Rc::new(RefCell::new(data)))
    }

    /// A detached node with no key and no value.
    pub fn empty() -> Self {
        Self::from_data(NodeData::new(None, Weak::new()))
    }

    /// A detached, empty map node.
    pub fn new_map() -> Self {
        let mut data = NodeData::new(None, Weak::new());
        data.source = Some(Content::Map(IndexMap::new()));
        Self::from_data(data)
    }

    /// A detached, empty list node.
    pub fn new_list() -> Self {
        let mut data = NodeData::new(None, Weak::new());
        data.source = Some(Content::List(Vec::new()));
        Self::from_data(data)
    }

    /// Wraps a raw value, building child nodes for maps and lists.
    pub fn wrap(value: impl Into<Value>) -> Self {
        let node = Self::empty();
        let content = node.build_content(value.into());
        node.0.borrow_mut().source = Some(content);
        node
    }

    /// A placeholder under `parent`. Keyless placeholders never attach.
    pub(crate) fn placeholder(parent: &Node, key: Option<String>) -> Self {
        Self::from_data(NodeData::new(key, Rc::downgrade(&parent.0)))
    }

    /// An unattached empty map placed under `parent` at `key`.
    pub(crate) fn detached_map(parent: &Node, key: &str) -> Self {
        let mut data = NodeData::new(Some(key.to_string()), Rc::downgrade(&parent.0));
        data.source = Some(Content::Map(IndexMap::new()));
        Self::from_data(data)
    }

    fn build_content(&self, value: Value) -> Content {
        match value {
            Value::Object(map) => {
                let mut children = IndexMap::with_capacity(map.len());
                for (key, raw) in map {
                    let child = Node::wrap(raw);
                    child.link(self, &key);
                    children.insert(key, child);
                }
                Content::Map(children)
            }
            Value::Array(items) => Content::List(
                items
                    .into_iter()
                    .map(|raw| {
                        let element = Node::wrap(raw);
                        element.link_element(self);
                        element
                    })
                    .collect(),
            ),
            other => Content::Scalar(other),
        }
    }

    /// Points every child of `content` back at this node.
    fn adopt(&self, content: &Content) {
        match content {
            Content::Map(children) => {
                for (key, child) in children {
                    child.link(self, key);
                }
            }
            Content::List(elements) => {
                for element in elements {
                    element.link_element(self);
                }
            }
            Content::Scalar(_) => {}
        }
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn link(&self, parent: &Node, key: &str) {
        let mut data = self.0.borrow_mut();
        data.parent = Rc::downgrade(&parent.0);
        data.key = Some(key.to_string());
    }

    /// Links a list element to its list; elements carry no key.
    pub(crate) fn link_element(&self, list: &Node) {
        let mut data = self.0.borrow_mut();
        data.parent = Rc::downgrade(&list.0);
        data.key = None;
    }

    pub(crate) fn unlink(&self) {
        self.0.borrow_mut().parent = Weak::new();
    }

    // --- identity -------------------------------------------------------

    pub fn key(&self) -> Option<String> {
        self.0.borrow().key.clone()
    }

    /// Renames the node, re-keying it inside its parent when attached.
    pub fn set_key(&self, key: Option<String>) -> &Self {
        let (parent, old) = {
            let data = self.0.borrow();
            (data.parent.upgrade().map(Node), data.key.clone())
        };
        if let Some(parent) = parent {
            let attached = old
                .as_deref()
                .and_then(|k| parent.child(k))
                .is_some_and(|c| c.ptr_eq(self));
            if attached && old != key {
                if let Some(old) = &old {
                    parent.remove(old);
                }
                if let Some(new) = &key {
                    parent.put(new.clone(), self.clone());
                }
            }
        }
        self.0.borrow_mut().key = key;
        self
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    /// The topmost ancestor, or this node when it has no parent.
    pub fn root(&self) -> Node {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    pub fn is_root(&self) -> bool {
        self.0.borrow().parent.upgrade().is_none()
    }

    // --- values ---------------------------------------------------------

    /// The effective value as a raw literal; `Null` when the node is empty.
    pub fn value(&self) -> Value {
        self.0
            .borrow()
            .content()
            .map(Content::literal)
            .unwrap_or(Value::Null)
    }

    /// Same as [`Node::value`].
    pub fn to_literal(&self) -> Value {
        self.value()
    }

    pub fn source_value(&self) -> Option<Value> {
        self.0.borrow().source.as_ref().map(Content::literal)
    }

    pub fn face_value(&self) -> Option<Value> {
        self.0.borrow().face.as_ref().map(Content::literal)
    }

    pub fn has_face(&self) -> bool {
        self.0.borrow().face.is_some()
    }

    /// Sets the effective value.
    ///
    /// An empty node takes the value as its source; otherwise the value
    /// becomes the face and the source is kept. A placeholder attaches
    /// itself to the tree.
    pub fn set_value(&self, value: impl Into<Value>) -> &Self {
        let content = self.build_content(value.into());
        let previous = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            let previous = data.content().map(Content::children).unwrap_or_default();
            if data.source.is_none() {
                data.source = Some(content);
            } else {
                data.face = Some(content);
            }
            previous
        };
        for child in previous {
            child.unlink();
        }
        self.attach();
        self.notify_changed(None, None);
        self
    }

    /// Replaces the source value, keeping any face.
    pub fn set_source_value(&self, value: Option<Value>) -> &Self {
        let content = value.map(|v| self.build_content(v));
        let previous = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            let shadowed = data.face.is_some();
            let old = std::mem::replace(&mut data.source, content);
            match old {
                Some(old) if !shadowed => old.children(),
                _ => Vec::new(),
            }
        };
        for child in previous {
            child.unlink();
        }
        if self.has_face() {
            self.detach_source_children();
        }
        self.notify_changed(None, None);
        self
    }

    /// Drops the face so reads fall back to the source.
    ///
    /// The source's children are re-parented to this node.
    pub fn clear_face(&self) -> &Self {
        let dropped = {
            let mut data = self.0.borrow_mut();
            data.cache = None;
            data.face.take()
        };
        let Some(dropped) = dropped else {
            return self;
        };
        for child in dropped.children() {
            child.unlink();
        }
        if let Some(source) = self.0.borrow().source.as_ref() {
            self.adopt(source);
        }
        self.notify_changed(None, None);
        self
    }

    /// Source children hidden behind a face are not part of the tree.
    fn detach_source_children(&self) {
        let hidden = self
            .0
            .borrow()
            .source
            .as_ref()
            .map(Content::children)
            .unwrap_or_default();
        for child in hidden {
            child.unlink();
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.0
            .borrow()
            .content()
            .map(Content::kind)
            .unwrap_or(NodeKind::Scalar)
    }

    pub fn is_map(&self) -> bool {
        self.kind() == NodeKind::Map
    }

    pub fn is_list(&self) -> bool {
        self.kind() == NodeKind::List
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == NodeKind::Scalar
    }

    /// True when there is no value or the value is `null`.
    pub fn is_empty(&self) -> bool {
        matches!(
            self.0.borrow().content(),
            None | Some(Content::Scalar(Value::Null))
        )
    }

    pub fn has_value(&self) -> bool {
        !self.is_empty()
    }

    /// A node is real when it has a key or a value.
    pub fn is_real(&self) -> bool {
        self.0.borrow().key.is_some() || self.has_value()
    }

    /// Number of children of a map or list; zero for scalars.
    pub fn len(&self) -> usize {
        match self.0.borrow().content() {
            Some(Content::Map(children)) => children.len(),
            Some(Content::List(elements)) => elements.len(),
            _ => 0,
        }
    }

    // --- comments -------------------------------------------------------

    pub fn top_comment(&self) -> Option<Vec<String>> {
        self.0.borrow().top_comment.clone()
    }

    pub fn side_comment(&self) -> Option<Vec<String>> {
        self.0.borrow().side_comment.clone()
    }

    pub fn has_top_comment(&self) -> bool {
        self.0
            .borrow()
            .top_comment
            .as_ref()
            .is_some_and(|lines| !lines.is_empty())
    }

    pub fn has_side_comment(&self) -> bool {
        self.0
            .borrow()
            .side_comment
            .as_ref()
            .is_some_and(|lines| !lines.is_empty())
    }

    pub fn set_top_comment(&self, lines: Option<Vec<String>>) -> &Self {
        self.0.borrow_mut().top_comment = lines;
        self
    }

    pub fn set_side_comment(&self, lines: Option<Vec<String>>) -> &Self {
        self.0.borrow_mut().side_comment = lines;
        self
    }

    pub fn add_top_comment<I, S>(&self, lines: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .borrow_mut()
            .top_comment
            .get_or_insert_with(Vec::new)
            .extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn add_side_comment<I, S>(&self, lines: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .borrow_mut()
            .side_comment
            .get_or_insert_with(Vec::new)
            .extend(lines.into_iter().map(Into::into));
        self
    }

    /// Copies each comment slot from `other` that is unset here.
    pub fn merge_comment(&self, other: &Node) -> &Self {
        if self.ptr_eq(other) {
            return self;
        }
        let (top, side) = {
            let data = other.0.borrow();
            (data.top_comment.clone(), data.side_comment.clone())
        };
        let mut data = self.0.borrow_mut();
        if data.top_comment.is_none() {
            data.top_comment = top;
        }
        if data.side_comment.is_none() {
            data.side_comment = side;
        }
        self
    }

    /// Takes `other`'s effective value as this node's source, plus its
    /// comments where unset.
    pub fn merge_from(&self, other: &Node) -> &Self {
        self.set_source_value(Some(other.value()));
        self.merge_comment(other)
    }

    // --- copies ---------------------------------------------------------

    /// A detached deep copy carrying the key, the effective value as its
    /// source and the comments of every copied node.
    pub fn copy(&self) -> Node {
        enum Snapshot {
            Map(Vec<(String, Node)>),
            List(Vec<Node>),
            Scalar(Value),
        }

        let (key, top, side, snapshot) = {
            let data = self.0.borrow();
            let snapshot = data.content().map(|content| match content {
                Content::Map(children) => Snapshot::Map(
                    children
                        .iter()
                        .map(|(k, c)| (k.clone(), c.clone()))
                        .collect(),
                ),
                Content::List(elements) => Snapshot::List(elements.clone()),
                Content::Scalar(value) => Snapshot::Scalar(value.clone()),
            });
            (
                data.key.clone(),
                data.top_comment.clone(),
                data.side_comment.clone(),
                snapshot,
            )
        };

        let copy = Node::empty();
        let content = snapshot.map(|snapshot| match snapshot {
            Snapshot::Map(children) => {
                let mut map = IndexMap::with_capacity(children.len());
                for (k, child) in children {
                    let child = child.copy();
                    child.link(&copy, &k);
                    map.insert(k, child);
                }
                Content::Map(map)
            }
            Snapshot::List(elements) => Content::List(
                elements
                    .iter()
                    .map(|element| {
                        let element = element.copy();
                        element.link_element(&copy);
                        element
                    })
                    .collect(),
            ),
            Snapshot::Scalar(value) => Content::Scalar(value),
        });
        {
            let mut data = copy.0.borrow_mut();
            data.key = key;
            data.top_comment = top;
            data.side_comment = side;
            data.source = content;
        }
        copy
    }

    // --- rendering ------------------------------------------------------

    /// Renders the value as compact JSON-like text: `{"k": v, ...}` for
    /// maps, `[a, b]` for lists and JSON scalars.
    pub fn to_json(&self) -> String {
        fn render(value: &Value, out: &mut String) {
            match value {
                Value::Object(map) => {
                    out.push('{');
                    for (i, (key, child)) in map.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&Value::String(key.clone()).to_string());
                        out.push_str(": ");
                        render(child, out);
                    }
                    out.push('}');
                }
                Value::Array(items) => {
                    out.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        render(item, out);
                    }
                    out.push(']');
                }
                other => out.push_str(&other.to_string()),
            }
        }

        let mut out = String::new();
        render(&self.value(), &mut out);
        out
    }

    // --- typed cache ----------------------------------------------------

    pub(crate) fn cached<T: Clone + 'static>(
        &self,
        parser: ParserId,
        collection: Option<CollectionKind>,
    ) -> Option<T> {
        let data = self.0.borrow();
        let cache = data.cache.as_ref()?;
        if cache.parser != parser || cache.collection != collection {
            return None;
        }
        cache.value.downcast_ref::<T>().cloned()
    }

    pub(crate) fn store_cached<T: 'static>(
        &self,
        parser: ParserId,
        collection: Option<CollectionKind>,
        value: T,
    ) {
        self.0.borrow_mut().cache = Some(ParsedCache {
            parser,
            collection,
            value: Rc::new(value),
        });
    }

    // --- memory ---------------------------------------------------------

    pub(crate) fn set_memory(&self, memory: Option<Rc<dyn SettingsMemory>>) {
        self.0.borrow_mut().memory = memory;
    }

    pub(crate) fn memory(&self) -> Option<Rc<dyn SettingsMemory>> {
        self.0.borrow().memory.clone()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new_map()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.value() == other.value()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key())
            .field("value", &self.value())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&strings::text(&self.value()))
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::wrap(value)
    }
}

impl From<Map<String, Value>> for Node {
    fn from(map: Map<String, Value>) -> Self {
        Node::wrap(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_value_keeps_source() {
        let node = Node::wrap("test");
        node.set_value(1234);
        assert_eq!(node.value(), json!(1234));
        assert_eq!(node.source_value(), Some(json!("test")));

        node.set_value(json!({"a": 1}));
        assert!(node.is_map());
        assert_eq!(node.source_value(), Some(json!("test")));

        node.clear_face();
        assert_eq!(node.value(), json!("test"));
    }

    #[test]
    fn test_clear_face_relinks_source_children() {
        let root = Node::wrap(json!({"a": {"b": 1}}));
        let a = root.get("a");
        let b = a.get("b");

        a.set_value(5);
        assert!(b.parent().is_none());
        a.clear_face();

        assert_eq!(a.value(), json!({"b": 1}));
        let b = a.get("b");
        assert!(b.is_attached());
        assert!(b.parent().is_some_and(|p| p.ptr_eq(&a)));
        assert!(b.delete(false));
        assert_eq!(root.value(), json!({"a": {}}));
    }

    #[test]
    fn test_face_over_map_swaps_parent_links() {
        let node = Node::wrap(json!({"src": 1}));
        let src = node.get("src");
        node.set_value(json!({"face": 2}));
        let face = node.get("face");
        assert!(face.is_attached());
        assert!(!src.is_attached());

        node.set_source_value(Some(json!({"other": 3})));
        assert_eq!(node.value(), json!({"face": 2}));
        assert!(face.is_attached());

        node.clear_face();
        assert!(!face.is_attached());
        assert!(node.get("other").is_attached());
    }

    #[test]
    fn test_copy_links_list_elements() {
        let copy = Node::wrap(json!({"l": [1, {"x": 2}]})).copy();
        let list = copy.get("l");
        for element in list.elements() {
            assert!(element.parent().is_some_and(|p| p.ptr_eq(&list)));
            assert!(element.key().is_none());
        }
    }

    #[test]
    fn test_empty_node_takes_source() {
        let node = Node::empty();
        assert!(node.is_empty());
        assert!(!node.is_real());
        node.set_value(false);
        assert_eq!(node.source_value(), Some(json!(false)));
        assert!(!node.has_face());
    }

    #[test]
    fn test_wrap_builds_children() {
        let node = Node::wrap(json!({"a": {"b": [1, 2]}, "c": null}));
        assert_eq!(node.len(), 2);
        let a = node.child("a").unwrap();
        assert_eq!(a.key().as_deref(), Some("a"));
        assert!(a.parent().unwrap().ptr_eq(&node));
        assert!(a.child("b").unwrap().is_list());
        assert!(node.child("c").unwrap().is_empty());
    }

    #[test]
    fn test_equality_is_value_based() {
        let a = Node::wrap(json!({"x": [1, 2]}));
        let b = Node::wrap(json!({"x": [1, 2]}));
        assert_eq!(a, b);
        b.get("x").set_value(3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_copy_is_detached_and_keeps_comments() {
        let root = Node::wrap(json!({"a": {"b": 1}}));
        let b = root.get_path(&["a", "b"]);
        b.add_top_comment(["about b"]);

        let copy = root.get("a").copy();
        assert!(copy.parent().is_none());
        assert_eq!(copy.key().as_deref(), Some("a"));
        let copied_b = copy.child("b").unwrap();
        assert_eq!(copied_b.top_comment(), Some(vec!["about b".to_string()]));

        copied_b.set_value(2);
        assert_eq!(root.get_path(&["a", "b"]).value(), json!(1));
    }

    #[test]
    fn test_merge_comment_fills_unset_slots() {
        let a = Node::wrap(1);
        a.set_side_comment(Some(vec!["keep".into()]));
        let b = Node::wrap(2);
        b.add_top_comment(["top"]).add_side_comment(["side"]);

        a.merge_comment(&b);
        assert_eq!(a.top_comment(), Some(vec!["top".to_string()]));
        assert_eq!(a.side_comment(), Some(vec!["keep".to_string()]));
    }

    #[test]
    fn test_to_json() {
        let node = Node::wrap(json!({"a": 1, "b": [true, "x"], "c": {}}));
        assert_eq!(node.to_json(), r#"{"a": 1, "b": [true, "x"], "c": {}}"#);
    }

    #[test]
    fn test_set_key_rekeys_in_parent() {
        let root = Node::wrap(json!({"a": 1, "b": 2}));
        root.get("a").set_key(Some("z".into()));
        assert_eq!(root.keys(), vec!["b".to_string(), "z".to_string()]);
        assert_eq!(root.get("z").value(), json!(1));
    }
}
