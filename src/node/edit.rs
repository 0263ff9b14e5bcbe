//! Leaf rewriting and argument substitution.

use super::{Node, NodeKind};
use crate::strings;
use serde_json::{Map, Value};
use std::convert::Infallible;

impl Node {
    /// Applies `edit` to every scalar leaf below this node.
    ///
    /// Returning `None` removes the leaf from its map or list and returning
    /// a different node puts that node in its place. Maps and lists always
    /// survive and are returned as-is.
    pub fn try_edit<E>(
        &self,
        edit: &mut dyn FnMut(&Node) -> Result<Option<Node>, E>,
    ) -> Result<Option<Node>, E> {
        match self.kind() {
            NodeKind::Map => {
                for (key, child) in self.entries() {
                    match child.try_edit(edit)? {
                        None => {
                            if self.child(&key).is_some_and(|c| c.ptr_eq(&child)) {
                                self.remove(&key);
                            }
                        }
                        Some(edited) if !edited.ptr_eq(&child) => {
                            self.put(key, edited);
                        }
                        Some(_) => {}
                    }
                }
                Ok(Some(self.clone()))
            }
            NodeKind::List => {
                let elements = self.elements();
                let mut edited = Vec::with_capacity(elements.len());
                let mut modified = false;
                for element in elements {
                    match element.try_edit(edit)? {
                        None => modified = true,
                        Some(node) => {
                            modified |= !node.ptr_eq(&element);
                            edited.push(node);
                        }
                    }
                }
                if modified {
                    self.replace_elements(edited);
                }
                Ok(Some(self.clone()))
            }
            NodeKind::Scalar => edit(self),
        }
    }

    /// Infallible form of [`Node::try_edit`].
    pub fn edit(&self, mut edit: impl FnMut(&Node) -> Option<Node>) -> Option<Node> {
        match self.try_edit::<Infallible>(&mut |node| Ok(edit(node))) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Rewrites every string leaf accepted by `filter` with `rewrite`.
    pub fn parse_strings(
        &self,
        filter: impl Fn(&str) -> bool,
        mut rewrite: impl FnMut(&Node, &str) -> Value,
    ) -> &Self {
        self.edit(|node| {
            if let Value::String(text) = node.value() {
                if filter(&text) {
                    let value = rewrite(node, &text);
                    node.set_value(value);
                }
            }
            Some(node.clone())
        });
        self
    }

    /// Substitutes positional `{N}` tokens in every string leaf.
    ///
    /// A leaf that is exactly `{N}` takes `args[N]` as its native value, or
    /// is deleted when that argument is `null`. Out-of-range tokens stay
    /// literal.
    pub fn replace_args(&self, args: &[Value]) -> &Self {
        if args.is_empty() {
            return self;
        }
        self.edit(|node| {
            let Value::String(text) = node.value() else {
                return Some(node.clone());
            };
            if text.len() < 3 || !text.contains('{') {
                return Some(node.clone());
            }
            if let Some(index) = strings::whole_index_token(&text) {
                match args.get(index) {
                    Some(Value::Null) => {
                        node.delete(true);
                        return None;
                    }
                    Some(arg) => {
                        node.set_value(arg.clone());
                    }
                    None => {}
                }
                return Some(node.clone());
            }
            let replaced = strings::replace_args(&text, args);
            if replaced != text {
                node.set_value(replaced);
            }
            Some(node.clone())
        });
        self
    }

    /// Substitutes named `{key}` tokens in every string leaf.
    ///
    /// A leaf that is exactly `{key}` takes the argument's native value.
    pub fn replace_named_args(&self, args: &Map<String, Value>) -> &Self {
        if args.is_empty() {
            return self;
        }
        self.edit(|node| {
            let Value::String(text) = node.value() else {
                return Some(node.clone());
            };
            if text.len() < 3 || !text.contains('{') {
                return Some(node.clone());
            }
            let whole = strings::whole_named_token(&text)
                .and_then(|key| args.get(key))
                .filter(|arg| !arg.is_null());
            match whole {
                Some(arg) => {
                    node.set_value(arg.clone());
                }
                None => {
                    let replaced = strings::replace_named_args(&text, args);
                    if replaced != text {
                        node.set_value(replaced);
                    }
                }
            }
            Some(node.clone())
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_args_native_and_text() {
        let node = Node::wrap(json!({
            "whole": "{0}",
            "mixed": "id-{1}",
            "list": ["{1}", "x"],
            "far": "{9}",
        }));
        node.replace_args(&[json!(42), json!("b")]);
        assert_eq!(
            node.value(),
            json!({"whole": 42, "mixed": "id-b", "list": ["b", "x"], "far": "{9}"})
        );
    }

    #[test]
    fn test_replace_args_null_deletes() {
        let node = Node::wrap(json!({"gone": "{0}", "kept": "{1}", "list": ["{0}", 1]}));
        node.replace_args(&[Value::Null, json!(true)]);
        assert_eq!(node.value(), json!({"kept": true, "list": [1]}));
    }

    #[test]
    fn test_replace_named_args() {
        let node = Node::wrap(json!({"greeting": "Hi {name}{suffix}", "who": "{name}", "n": "{count}"}));
        let args = json!({"name": "Bob", "suffix": "!", "count": 3});
        node.replace_named_args(args.as_object().unwrap());
        assert_eq!(
            node.value(),
            json!({"greeting": "Hi Bob!", "who": "Bob", "n": 3})
        );
    }

    #[test]
    fn test_edit_replaces_and_removes() {
        let node = Node::wrap(json!({"a": 1, "b": "drop", "c": [1, "drop"]}));
        node.edit(|leaf| match leaf.value() {
            Value::String(s) if s == "drop" => None,
            Value::Number(_) => Some(Node::wrap("num")),
            _ => Some(leaf.clone()),
        });
        assert_eq!(node.value(), json!({"a": "num", "c": ["num"]}));
    }

    #[test]
    fn test_parse_strings() {
        let node = Node::wrap(json!({"a": "up", "b": ["down"], "c": 1}));
        node.parse_strings(|s| s.starts_with('u'), |_, s| json!(s.to_uppercase()));
        assert_eq!(node.value(), json!({"a": "UP", "b": ["down"], "c": 1}));
    }
}
