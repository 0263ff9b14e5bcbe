//! Registry of parsers keyed by target type.

use super::builtin;
use super::parser::TypeParser;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use uuid::Uuid;

/// Value substituted when a primitive lookup has nothing to convert.
pub trait Sentinel: Sized {
    fn sentinel() -> Self;
}

macro_rules! min_sentinel {
    ($($t:ty),*) => {
        $(impl Sentinel for $t {
            fn sentinel() -> Self {
                <$t>::MIN
            }
        })*
    };
}

min_sentinel!(i8, i16, i32, i64);

impl Sentinel for f32 {
    /// Smallest positive subnormal.
    fn sentinel() -> Self {
        f32::from_bits(1)
    }
}

impl Sentinel for f64 {
    fn sentinel() -> Self {
        f64::from_bits(1)
    }
}

impl Sentinel for bool {
    fn sentinel() -> Self {
        false
    }
}

impl Sentinel for char {
    fn sentinel() -> Self {
        '\0'
    }
}

/// Maps target types to the parser used for them.
#[derive(Default)]
pub struct TypeRegistry {
    parsers: HashMap<TypeId, Box<dyn Any>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in parser.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(builtin::object());
        registry.add(builtin::string());
        registry.add(builtin::character());
        registry.add(builtin::boolean());
        registry.add(builtin::byte());
        registry.add(builtin::short());
        registry.add(builtin::int());
        registry.add(builtin::long());
        registry.add(builtin::float());
        registry.add(builtin::double());
        registry.add(builtin::unique_id());
        registry
    }

    /// Registers `parser` for `T`, returning the one it replaces.
    pub fn add<T: 'static>(&mut self, parser: TypeParser<T>) -> Option<TypeParser<T>> {
        self.parsers
            .insert(TypeId::of::<T>(), Box::new(parser))
            .and_then(|old| old.downcast::<TypeParser<T>>().ok())
            .map(|old| *old)
    }

    pub fn remove<T: 'static>(&mut self) -> bool {
        self.parsers.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.parsers.contains_key(&TypeId::of::<T>())
    }

    pub fn parser<T: 'static>(&self) -> Option<TypeParser<T>> {
        self.parsers
            .get(&TypeId::of::<T>())
            .and_then(|parser| parser.downcast_ref::<TypeParser<T>>())
            .cloned()
    }

    pub fn parse<T: 'static>(&self, value: &Value) -> Option<T> {
        self.parser::<T>()?.parse(value)
    }

    pub fn parse_or<T: 'static>(&self, value: &Value, default: T) -> T {
        self.parse(value).unwrap_or(default)
    }

    /// Parses into a primitive, falling back to its sentinel.
    pub fn parse_primitive<T: Sentinel + 'static>(&self, value: &Value) -> T {
        self.parse(value).unwrap_or_else(T::sentinel)
    }

    pub fn parse_uuid(&self, value: &Value) -> Option<Uuid> {
        self.parse(value)
    }
}
