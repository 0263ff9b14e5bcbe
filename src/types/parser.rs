//! Composable value parsers.

use crate::error::TypeError;
use indexmap::IndexSet;
use serde_json::Value;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a parser, used to key a node's conversion cache.
///
/// Clones of a parser share its id; every combinator gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserId(u64);

static NEXT_PARSER_ID: AtomicU64 = AtomicU64::new(1024);

impl ParserId {
    pub fn next() -> Self {
        ParserId(NEXT_PARSER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) const fn builtin(id: u64) -> Self {
        ParserId(id)
    }
}

/// Container shape of a cached conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

type ParseFn<T> = dyn Fn(&Value) -> Result<Option<T>, TypeError>;

/// Converts raw values into `T`.
///
/// `null` always parses to `None`. Lenient parsers return `None` for
/// anything they cannot convert; strict ones may report a [`TypeError`]
/// through [`TypeParser::try_parse`].
pub struct TypeParser<T> {
    id: ParserId,
    func: Rc<ParseFn<T>>,
}

impl<T> Clone for TypeParser<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Rc::clone(&self.func),
        }
    }
}

impl<T> std::fmt::Debug for TypeParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeParser").field("id", &self.id).finish()
    }
}

impl<T: 'static> TypeParser<T> {
    pub fn new(parse: impl Fn(&Value) -> Option<T> + 'static) -> Self {
        Self::strict(move |value| Ok(parse(value)))
    }

    pub fn strict(parse: impl Fn(&Value) -> Result<Option<T>, TypeError> + 'static) -> Self {
        Self {
            id: ParserId::next(),
            func: Rc::new(parse),
        }
    }

    pub(crate) fn with_id(mut self, id: ParserId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ParserId {
        self.id
    }

    pub fn try_parse(&self, value: &Value) -> Result<Option<T>, TypeError> {
        if value.is_null() {
            return Ok(None);
        }
        (self.func)(value)
    }

    pub fn parse(&self, value: &Value) -> Option<T> {
        self.try_parse(value).ok().flatten()
    }

    pub fn parse_or(&self, value: &Value, default: T) -> T {
        self.parse(value).unwrap_or(default)
    }

    /// Parses each element of a list (or the value itself when it is not a
    /// list), dropping elements that do not convert.
    pub fn list(&self, value: &Value) -> Vec<T> {
        elements(value)
            .into_iter()
            .filter_map(|element| self.parse(element))
            .collect()
    }

    /// Like [`TypeParser::list`], without duplicates.
    pub fn set(&self, value: &Value) -> IndexSet<T>
    where
        T: Hash + Eq,
    {
        elements(value)
            .into_iter()
            .filter_map(|element| self.parse(element))
            .collect()
    }

    /// Applies `parser` to the first non-null element of a list, or to the
    /// value itself.
    pub fn single(parser: TypeParser<T>) -> Self {
        Self::strict(move |value| match value {
            Value::Array(items) => match items.iter().find(|item| !item.is_null()) {
                Some(item) => parser.try_parse(item),
                None => Ok(None),
            },
            other => parser.try_parse(other),
        })
    }

    /// Unwraps one level of list before applying `parser`.
    ///
    /// Lists made only of integers are packed primitive arrays and are
    /// passed through whole.
    pub fn first(parser: TypeParser<T>) -> Self {
        Self::strict(move |value| match value {
            Value::Array(items) if !is_integer_array(items) => match items.first() {
                Some(item) => parser.try_parse(item),
                None => Ok(None),
            },
            other => parser.try_parse(other),
        })
    }

    /// Like [`TypeParser::single`], reading booleans as `1` and `0`.
    pub fn number(parser: TypeParser<T>) -> Self {
        Self::single(Self::strict(move |value| match value {
            Value::Bool(b) => parser.try_parse(&Value::from(u8::from(*b))),
            other => parser.try_parse(other),
        }))
    }

    /// Maps the parsed value with `map`.
    pub fn map<U: 'static>(self, map: impl Fn(T) -> U + 'static) -> TypeParser<U> {
        TypeParser::strict(move |value| Ok(self.try_parse(value)?.map(&map)))
    }
}

fn elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn is_integer_array(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(|item| item.is_i64() || item.is_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_i64() -> TypeParser<i64> {
        TypeParser::new(Value::as_i64)
    }

    #[test]
    fn test_null_is_none() {
        assert_eq!(as_i64().parse(&Value::Null), None);
    }

    #[test]
    fn test_single_uses_first_non_null() {
        let parser = TypeParser::single(as_i64());
        assert_eq!(parser.parse(&json!([null, 3, 4])), Some(3));
        assert_eq!(parser.parse(&json!(5)), Some(5));
        assert_eq!(parser.parse(&json!([])), None);
    }

    #[test]
    fn test_first_keeps_integer_arrays() {
        let parser = TypeParser::first(TypeParser::new(|v: &Value| Some(v.clone())));
        assert_eq!(parser.parse(&json!([1, 2])), Some(json!([1, 2])));
        assert_eq!(parser.parse(&json!(["a", "b"])), Some(json!("a")));
    }

    #[test]
    fn test_number_reads_booleans() {
        let parser = TypeParser::number(as_i64());
        assert_eq!(parser.parse(&json!(true)), Some(1));
        assert_eq!(parser.parse(&json!([false])), Some(0));
    }

    #[test]
    fn test_list_and_set() {
        let parser = as_i64();
        assert_eq!(parser.list(&json!([1, "x", 2, 1])), vec![1, 2, 1]);
        assert_eq!(parser.list(&json!(7)), vec![7]);
        let set = parser.set(&json!([1, 2, 1]));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_clones_share_id() {
        let parser = as_i64();
        assert_eq!(parser.clone().id(), parser.id());
        assert_ne!(TypeParser::single(parser.clone()).id(), parser.id());
    }
}
