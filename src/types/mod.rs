//! Typed views over raw node values.
//!
//! A [`TypeParser`] turns a raw value into a Rust type. Nodes cache the
//! last successful conversion per parser, so repeated reads of the same
//! type are cheap until the node's value changes.

pub mod builtin;
mod parser;
mod registry;

pub use parser::{CollectionKind, ParserId, TypeParser};
pub use registry::{Sentinel, TypeRegistry};

use crate::node::Node;
use indexmap::IndexSet;
use serde_json::Value;
use std::hash::Hash;
use uuid::Uuid;

impl Node {
    /// Converts the effective value with `parser`, caching a hit.
    pub fn parse_as<T: Clone + 'static>(&self, parser: &TypeParser<T>) -> Option<T> {
        if let Some(cached) = self.cached::<T>(parser.id(), None) {
            return Some(cached);
        }
        let parsed = parser.parse(&self.value())?;
        self.store_cached(parser.id(), None, parsed.clone());
        Some(parsed)
    }

    pub fn parse_as_or<T: Clone + 'static>(&self, parser: &TypeParser<T>, default: T) -> T {
        self.parse_as(parser).unwrap_or(default)
    }

    /// Converts each element (or the scalar itself) with `parser`.
    pub fn parse_list<T: Clone + 'static>(&self, parser: &TypeParser<T>) -> Vec<T> {
        if let Some(cached) = self.cached::<Vec<T>>(parser.id(), Some(CollectionKind::List)) {
            return cached;
        }
        let parsed = parser.list(&self.value());
        self.store_cached(parser.id(), Some(CollectionKind::List), parsed.clone());
        parsed
    }

    pub fn parse_set<T: Clone + Eq + Hash + 'static>(&self, parser: &TypeParser<T>) -> IndexSet<T> {
        if let Some(cached) = self.cached::<IndexSet<T>>(parser.id(), Some(CollectionKind::Set)) {
            return cached;
        }
        let parsed = parser.set(&self.value());
        self.store_cached(parser.id(), Some(CollectionKind::Set), parsed.clone());
        parsed
    }

    /// Converts with whatever parser `registry` holds for `T`.
    pub fn as_type<T: Clone + 'static>(&self, registry: &TypeRegistry) -> Option<T> {
        self.parse_as(&registry.parser::<T>()?)
    }

    pub fn as_object(&self) -> Option<Value> {
        self.parse_as(&builtin::object())
    }

    pub fn as_string(&self) -> Option<String> {
        self.parse_as(&builtin::string())
    }

    pub fn as_string_or(&self, default: &str) -> String {
        self.as_string().unwrap_or_else(|| default.to_string())
    }

    pub fn as_text(&self) -> Option<String> {
        self.parse_as(&builtin::text())
    }

    pub fn as_char(&self) -> Option<char> {
        self.parse_as(&builtin::character())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.parse_as(&builtin::boolean())
    }

    pub fn as_bool_or(&self, default: bool) -> bool {
        self.as_bool().unwrap_or(default)
    }

    pub fn as_i8(&self) -> Option<i8> {
        self.parse_as(&builtin::byte())
    }

    pub fn as_i16(&self) -> Option<i16> {
        self.parse_as(&builtin::short())
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.parse_as(&builtin::int())
    }

    pub fn as_i32_or(&self, default: i32) -> i32 {
        self.as_i32().unwrap_or(default)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.parse_as(&builtin::long())
    }

    pub fn as_i64_or(&self, default: i64) -> i64 {
        self.as_i64().unwrap_or(default)
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.parse_as(&builtin::float())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.parse_as(&builtin::double())
    }

    pub fn as_f64_or(&self, default: f64) -> f64 {
        self.as_f64().unwrap_or(default)
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        self.parse_as(&builtin::unique_id())
    }

    pub fn as_list(&self) -> Vec<Value> {
        self.parse_list(&builtin::object())
    }

    pub fn as_string_list(&self) -> Vec<String> {
        self.parse_list(&builtin::string())
    }

    pub fn as_bool_list(&self) -> Vec<bool> {
        self.parse_list(&builtin::boolean())
    }

    pub fn as_i32_list(&self) -> Vec<i32> {
        self.parse_list(&builtin::int())
    }

    pub fn as_i64_list(&self) -> Vec<i64> {
        self.parse_list(&builtin::long())
    }

    pub fn as_f64_list(&self) -> Vec<f64> {
        self.parse_list(&builtin::double())
    }

    pub fn as_uuid_list(&self) -> Vec<Uuid> {
        self.parse_list(&builtin::unique_id())
    }

    pub fn as_string_set(&self) -> IndexSet<String> {
        self.parse_set(&builtin::string())
    }

    pub fn as_i64_set(&self) -> IndexSet<i64> {
        self.parse_set(&builtin::long())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_conversions() {
        let node = Node::wrap(json!({
            "num": "1234",
            "ch": "3",
            "flag": true,
            "list": [1, "2", "x"],
            "words": ["a", "b", "a"],
        }));
        assert_eq!(node.get("num").as_i32(), Some(1234));
        assert_eq!(node.get("ch").as_f32(), Some(3.0));
        assert_eq!(node.get("flag").as_i64(), Some(1));
        assert_eq!(node.get("list").as_i64_list(), vec![1, 2]);
        assert_eq!(node.get("list").as_string_list(), vec!["1", "2", "x"]);
        assert_eq!(node.get("words").as_string_set().len(), 2);
        assert_eq!(node.get("missing").as_i32_or(5), 5);
    }

    #[test]
    fn test_cache_invalidated_by_set_value() {
        let node = Node::wrap("10");
        assert_eq!(node.as_i32(), Some(10));
        assert_eq!(node.as_i32(), Some(10));
        node.set_value(20);
        assert_eq!(node.as_i32(), Some(20));
    }

    #[test]
    fn test_element_edit_invalidates_list_cache() {
        let root = Node::wrap(json!({"list": [1, 2, 3]}));
        let list = root.get("list");
        assert_eq!(list.as_i64_list(), vec![1, 2, 3]);

        let first = list.element(0).unwrap();
        assert!(first.parent().is_some_and(|p| p.ptr_eq(&list)));
        first.set_value(99);
        assert_eq!(list.as_i64_list(), vec![99, 2, 3]);

        list.push(Node::wrap(4));
        assert_eq!(list.as_i64_list(), vec![99, 2, 3, 4]);
    }

    #[test]
    fn test_nested_edit_invalidates_ancestor_caches() {
        let root = Node::wrap(json!({"a": {"b": ["x", "y"]}}));
        let a = root.get("a");
        let b = a.get("b");
        assert_eq!(b.as_string(), Some("x".to_string()));
        assert_eq!(a.as_object(), Some(json!({"b": ["x", "y"]})));

        b.element(0).unwrap().set_value("z");
        assert_eq!(b.as_string(), Some("z".to_string()));
        assert_eq!(a.as_object(), Some(json!({"b": ["z", "y"]})));

        a.put_value("c", 1);
        assert_eq!(a.as_object(), Some(json!({"b": ["z", "y"], "c": 1})));
    }

    #[test]
    fn test_list_and_set_caches_do_not_collide() {
        let node = Node::wrap(json!([3, 3, 4]));
        assert_eq!(node.as_i64_list(), vec![3, 3, 4]);
        assert_eq!(node.as_i64_set().len(), 2);
        assert_eq!(node.as_i64_list(), vec![3, 3, 4]);
        assert_eq!(node.as_i64(), Some(3));
    }

    #[test]
    fn test_as_type_uses_registry() {
        let mut registry = TypeRegistry::standard();
        registry.add(TypeParser::new(|v: &Value| v.as_str().map(str::len)));
        let node = Node::wrap("four");
        assert_eq!(node.as_type::<usize>(&registry), Some(4));
        assert_eq!(node.as_type::<Uuid>(&registry), None);
    }
}
