//! Built-in parsers for common target types.
//!
//! Numbers accept numeric values, numeric strings and booleans (as 1/0);
//! the first non-null element of a list stands in for the list. Narrowing a
//! numeric value wraps and float-to-integer conversion saturates; numeric
//! text outside the target's range is an error.

use super::parser::{ParserId, TypeParser};
use crate::error::TypeError;
use crate::strings;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

const OBJECT: ParserId = ParserId::builtin(1);
const STRING: ParserId = ParserId::builtin(2);
const TEXT: ParserId = ParserId::builtin(3);
const CHARACTER: ParserId = ParserId::builtin(4);
const BOOLEAN: ParserId = ParserId::builtin(5);
const BYTE: ParserId = ParserId::builtin(6);
const SHORT: ParserId = ParserId::builtin(7);
const INT: ParserId = ParserId::builtin(8);
const LONG: ParserId = ParserId::builtin(9);
const FLOAT: ParserId = ParserId::builtin(10);
const DOUBLE: ParserId = ParserId::builtin(11);
const UNIQUE_ID: ParserId = ParserId::builtin(12);

/// Passes any non-null value through.
pub fn object() -> TypeParser<Value> {
    TypeParser::new(|value| Some(value.clone())).with_id(OBJECT)
}

/// Text form of a scalar, or of the first element of a list.
pub fn string() -> TypeParser<String> {
    TypeParser::single(TypeParser::new(|value| Some(strings::text(value)))).with_id(STRING)
}

/// Text form of any value; lists render as `[a, b]`.
pub fn text() -> TypeParser<String> {
    TypeParser::new(|value| Some(strings::text(value))).with_id(TEXT)
}

/// First character of the text form.
pub fn character() -> TypeParser<char> {
    TypeParser::single(TypeParser::new(|value| strings::text(value).chars().next()))
        .with_id(CHARACTER)
}

/// `true/t/yes/y/on/1` and `false/f/no/n/off/0`, case-insensitive.
pub fn boolean() -> TypeParser<bool> {
    TypeParser::single(TypeParser::new(|value| {
        let text = match value {
            Value::Bool(b) => return Some(*b),
            Value::Number(n) => integer_of(n).to_string(),
            other => strings::text(other).to_lowercase(),
        };
        match text.as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        }
    }))
    .with_id(BOOLEAN)
}

pub fn byte() -> TypeParser<i8> {
    integer("byte", |n| n as i8).with_id(BYTE)
}

pub fn short() -> TypeParser<i16> {
    integer("short", |n| n as i16).with_id(SHORT)
}

pub fn int() -> TypeParser<i32> {
    integer("int", |n| n as i32).with_id(INT)
}

pub fn long() -> TypeParser<i64> {
    integer("long", |n| n).with_id(LONG)
}

pub fn float() -> TypeParser<f32> {
    decimal("float", |n| n as f32).with_id(FLOAT)
}

pub fn double() -> TypeParser<f64> {
    decimal("double", |n| n).with_id(DOUBLE)
}

/// A UUID from its string form or from four packed 32-bit integers.
pub fn unique_id() -> TypeParser<Uuid> {
    TypeParser::first(TypeParser::strict(|value| match value {
        Value::Array(items) => uuid_from_ints(items),
        Value::String(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| TypeError::InvalidUuid(s.clone())),
        _ => Ok(None),
    }))
    .with_id(UNIQUE_ID)
}

fn integer_of(n: &serde_json::Number) -> i64 {
    n.as_i64()
        .or_else(|| n.as_u64().map(|u| u as i64))
        .or_else(|| n.as_f64().map(|f| f as i64))
        .unwrap_or_default()
}

fn integer<T: FromStr + 'static>(target: &'static str, narrow: fn(i64) -> T) -> TypeParser<T> {
    TypeParser::number(TypeParser::strict(move |value| match value {
        Value::Number(n) => Ok(Some(narrow(integer_of(n)))),
        Value::String(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| TypeError::InvalidNumber {
                value: s.clone(),
                target,
            }),
        _ => Ok(None),
    }))
}

fn decimal<T: 'static>(target: &'static str, narrow: fn(f64) -> T) -> TypeParser<T> {
    TypeParser::number(TypeParser::strict(move |value| match value {
        Value::Number(n) => Ok(n.as_f64().map(narrow)),
        Value::String(s) => s
            .parse::<f64>()
            .map(|n| Some(narrow(n)))
            .map_err(|_| TypeError::InvalidNumber {
                value: s.clone(),
                target,
            }),
        _ => Ok(None),
    }))
}

fn uuid_from_ints(items: &[Value]) -> Result<Option<Uuid>, TypeError> {
    if items.len() != 4 {
        return Ok(None);
    }
    let mut hex = String::with_capacity(32);
    for item in items {
        let Some(n) = item.as_i64() else {
            return Ok(None);
        };
        hex.push_str(&format!("{:08x}", n as i32 as u32));
    }
    Uuid::parse_str(&hex)
        .map(Some)
        .map_err(|_| TypeError::InvalidUuid(hex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_from_strings_and_chars() {
        assert_eq!(int().parse(&json!("1234")), Some(1234));
        assert_eq!(float().parse(&json!("3")), Some(3.0));
        assert_eq!(long().parse(&json!(true)), Some(1));
        assert_eq!(double().parse(&json!([2.5, 3])), Some(2.5));
        assert_eq!(byte().parse(&json!(300)), Some(44));
    }

    #[test]
    fn test_malformed_number_is_strict_error() {
        let err = int().try_parse(&json!("12a")).unwrap_err();
        assert!(matches!(err, TypeError::InvalidNumber { target: "int", .. }));
        assert_eq!(int().parse(&json!("12a")), None);
    }

    #[test]
    fn test_out_of_range_text_is_strict_error() {
        let err = int().try_parse(&json!("99999999999")).unwrap_err();
        assert!(matches!(err, TypeError::InvalidNumber { target: "int", .. }));
        assert!(byte().try_parse(&json!("300")).is_err());
        assert_eq!(byte().parse(&json!("300")), None);
        assert_eq!(byte().parse(&json!("-128")), Some(-128));
        assert_eq!(long().parse(&json!("99999999999")), Some(99_999_999_999));
    }

    #[test]
    fn test_booleans() {
        assert_eq!(boolean().parse(&json!("Yes")), Some(true));
        assert_eq!(boolean().parse(&json!("f")), Some(false));
        assert_eq!(boolean().parse(&json!("OFF")), Some(false));
        assert_eq!(boolean().parse(&json!(1)), Some(true));
        assert_eq!(boolean().parse(&json!(1.7)), Some(true));
        assert_eq!(boolean().parse(&json!(2)), None);
        assert_eq!(boolean().parse(&json!("maybe")), None);
    }

    #[test]
    fn test_strings_and_characters() {
        assert_eq!(string().parse(&json!(1234)), Some("1234".to_string()));
        assert_eq!(string().parse(&json!(["a", "b"])), Some("a".to_string()));
        assert_eq!(text().parse(&json!(["a", "b"])), Some("[a, b]".to_string()));
        assert_eq!(character().parse(&json!("test")), Some('t'));
        assert_eq!(character().parse(&json!("")), None);
    }

    #[test]
    fn test_uuid_from_packed_ints() {
        let packed = json!([2090861532, 392122143, -1265609135, 72552877]);
        let expected = Uuid::parse_str("7ca003dc-175f-4f1f-b490-5651045311ad").unwrap();
        assert_eq!(unique_id().parse(&packed), Some(expected));
    }

    #[test]
    fn test_uuid_strict_errors() {
        assert!(unique_id().try_parse(&json!("not-a-uuid")).is_err());
        assert_eq!(unique_id().parse(&json!(42)), None);
        let text = "7ca003dc-175f-4f1f-b490-5651045311ad";
        assert_eq!(
            unique_id().parse(&json!([text])).map(|u| u.to_string()),
            Some(text.to_string())
        );
    }
}
