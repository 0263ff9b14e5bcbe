//! Declarative migrations for settings trees.
//!
//! A [`NodeUpdate`] selects a node (by exact, case-insensitive or regex
//! path) and applies one action to it. A [`SettingsUpdater`] runs a list of
//! updates in order, optionally after filling in missing defaults from a
//! provider tree.

mod updater;

pub use updater::{SettingsUpdater, UpdateRules};

use crate::node::Node;
use crate::strings;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// How an update finds its target node.
#[derive(Clone)]
pub enum NodeSelector {
    Exact(Vec<String>),
    IgnoreCase(Vec<String>),
    Regex(Vec<String>),
    Custom(Rc<dyn Fn(&Node) -> Node>),
}

impl NodeSelector {
    pub fn select(&self, root: &Node) -> Node {
        match self {
            NodeSelector::Exact(path) => root.get_path(path),
            NodeSelector::IgnoreCase(path) => root.get_ignore_case_path(path),
            NodeSelector::Regex(patterns) => root.get_regex_path(patterns),
            NodeSelector::Custom(select) => select(root),
        }
    }
}

impl fmt::Debug for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSelector::Exact(path) => f.debug_tuple("Exact").field(path).finish(),
            NodeSelector::IgnoreCase(path) => f.debug_tuple("IgnoreCase").field(path).finish(),
            NodeSelector::Regex(patterns) => f.debug_tuple("Regex").field(patterns).finish(),
            NodeSelector::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// What an update does to its target.
#[derive(Clone)]
pub enum UpdateAction {
    /// Sets the value when the target has none; keyless targets are then
    /// placed at the update's `to` path.
    Add(Value),
    /// Removes the target, pruning maps left empty.
    Delete,
    /// Overwrites the target's value.
    Replace(Value),
    /// Relocates the target to the `to` path.
    Move,
    /// Runs a function over the whole tree; it reports whether it changed
    /// anything.
    Custom(Rc<dyn Fn(&Node) -> bool>),
}

impl UpdateAction {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateAction::Add(_) => "add",
            UpdateAction::Delete => "delete",
            UpdateAction::Replace(_) => "replace",
            UpdateAction::Move => "move",
            UpdateAction::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateAction::Add(value) => f.debug_tuple("Add").field(value).finish(),
            UpdateAction::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            other => f.write_str(other.name()),
        }
    }
}

fn owned_path<I, S>(path: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    path.into_iter().map(Into::into).collect()
}

/// One migration step.
#[derive(Debug, Clone)]
pub struct NodeUpdate {
    action: UpdateAction,
    from: Option<NodeSelector>,
    to: Option<Vec<String>>,
}

impl NodeUpdate {
    pub fn new(action: UpdateAction) -> Self {
        Self {
            action,
            from: None,
            to: None,
        }
    }

    pub fn add(value: impl Into<Value>) -> Self {
        Self::new(UpdateAction::Add(value.into()))
    }

    pub fn delete() -> Self {
        Self::new(UpdateAction::Delete)
    }

    pub fn replace(value: impl Into<Value>) -> Self {
        Self::new(UpdateAction::Replace(value.into()))
    }

    pub fn move_node() -> Self {
        Self::new(UpdateAction::Move)
    }

    pub fn custom(apply: impl Fn(&Node) -> bool + 'static) -> Self {
        Self::new(UpdateAction::Custom(Rc::new(apply)))
    }

    pub fn from<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from = Some(NodeSelector::Exact(owned_path(path)));
        self
    }

    /// Selects by a dotted path; `\.` is a literal dot.
    pub fn from_split(mut self, path: &str) -> Self {
        self.from = Some(NodeSelector::Exact(strings::split_escaped(path, '.')));
        self
    }

    pub fn from_ignore_case<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from = Some(NodeSelector::IgnoreCase(owned_path(path)));
        self
    }

    pub fn from_regex<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from = Some(NodeSelector::Regex(owned_path(patterns)));
        self
    }

    pub fn from_selector(mut self, select: impl Fn(&Node) -> Node + 'static) -> Self {
        self.from = Some(NodeSelector::Custom(Rc::new(select)));
        self
    }

    pub fn to<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to = Some(owned_path(path));
        self
    }

    pub fn to_split(mut self, path: &str) -> Self {
        self.to = Some(strings::split_escaped(path, '.'));
        self
    }

    pub fn action(&self) -> &UpdateAction {
        &self.action
    }

    pub fn selector(&self) -> Option<&NodeSelector> {
        self.from.as_ref()
    }

    pub fn destination(&self) -> Option<&[String]> {
        self.to.as_deref()
    }

    /// Applies the update to `root`; returns whether the tree changed.
    ///
    /// Updates other than `Custom` do nothing without a selector.
    pub fn apply(&self, root: &Node) -> bool {
        if let UpdateAction::Custom(apply) = &self.action {
            return apply(root);
        }
        let Some(selector) = &self.from else {
            return false;
        };
        let node = selector.select(root);

        match &self.action {
            UpdateAction::Add(value) => {
                if node.has_value() {
                    return false;
                }
                node.set_value(value.clone());
                if node.key().is_none() {
                    if let Some(to) = &self.to {
                        node.move_to(to);
                    }
                }
                node.is_attached()
            }
            UpdateAction::Delete => node.delete(true),
            UpdateAction::Replace(value) => {
                let changed = !node.is_attached() || node.value() != *value;
                node.set_value(value.clone());
                changed && node.is_attached()
            }
            UpdateAction::Move => match &self.to {
                Some(to) if node.is_attached() => {
                    node.move_to(to);
                    true
                }
                _ => false,
            },
            UpdateAction::Custom(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Node {
        Node::wrap(json!({
            "key1": "value",
            "Mixed": {"Case": 1},
            "key3": {"sub1": true},
        }))
    }

    #[test]
    fn test_add_only_when_missing() {
        let root = tree();
        assert!(!NodeUpdate::add("other").from(["key1"]).apply(&root));
        assert_eq!(root.get("key1").value(), json!("value"));

        assert!(NodeUpdate::add(5).from(["new", "leaf"]).apply(&root));
        assert_eq!(root.get_split("new.leaf").value(), json!(5));
    }

    #[test]
    fn test_add_relocates_keyless_target() {
        let root = tree();
        let update = NodeUpdate::add("fallback")
            .from_regex(["nothing.*"])
            .to(["placed", "here"]);
        assert!(update.apply(&root));
        assert_eq!(root.get_split("placed.here").value(), json!("fallback"));
    }

    #[test]
    fn test_delete_prunes() {
        let root = tree();
        assert!(NodeUpdate::delete().from_split("key3.sub1").apply(&root));
        assert!(!root.contains_key("key3"));
        assert!(!NodeUpdate::delete().from_split("key3.sub1").apply(&root));
    }

    #[test]
    fn test_replace_reports_difference() {
        let root = tree();
        assert!(NodeUpdate::replace("value2").from(["key1"]).apply(&root));
        assert!(!NodeUpdate::replace("value2").from(["key1"]).apply(&root));
        assert_eq!(root.get("key1").value(), json!("value2"));
    }

    #[test]
    fn test_move_case_insensitive() {
        let root = tree();
        let update = NodeUpdate::move_node()
            .from_ignore_case(["mixed", "case"])
            .to(["fixed", "case"]);
        assert!(update.apply(&root));
        assert_eq!(root.get_split("fixed.case").value(), json!(1));
        assert!(!root.contains_key("Mixed"));
        assert!(!update.apply(&root));
    }

    #[test]
    fn test_custom_runs_over_root() {
        let root = tree();
        let update = NodeUpdate::custom(|root| root.remove("key1").is_some());
        assert!(update.apply(&root));
        assert!(!update.apply(&root));
    }

    #[test]
    fn test_no_selector_is_noop() {
        let root = tree();
        assert!(!NodeUpdate::delete().apply(&root));
        assert_eq!(root.len(), 3);
    }
}
