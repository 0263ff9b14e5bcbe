//! The `math` expression, backed by a pluggable arithmetic evaluator.

use super::ExpressionHandler;
use crate::error::{Result, SettingsError};
use crate::node::Node;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::rc::Rc;
use std::str::FromStr;

/// Result of evaluating an arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Number(f64),
    Boolean(bool),
    String(String),
    DateTime(DateTime<Utc>),
    Duration(TimeDelta),
    Array(Vec<Evaluation>),
    Structure(IndexMap<String, Evaluation>),
    Null,
}

/// Evaluates arithmetic expression text.
pub trait Evaluator {
    fn evaluate(&self, expression: &str) -> std::result::Result<Evaluation, String>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> std::result::Result<Evaluation, String>,
{
    fn evaluate(&self, expression: &str) -> std::result::Result<Evaluation, String> {
        self(expression)
    }
}

/// Requested shape of a `math` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Number,
    Boolean,
    String,
    DateTime,
    Duration,
    Array,
    Structure,
    Null,
}

impl FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NUMBER" => Ok(Self::Number),
            "BOOLEAN" => Ok(Self::Boolean),
            "STRING" => Ok(Self::String),
            "DATE_TIME" => Ok(Self::DateTime),
            "DURATION" => Ok(Self::Duration),
            "ARRAY" => Ok(Self::Array),
            "STRUCTURE" => Ok(Self::Structure),
            "NULL" => Ok(Self::Null),
            other => Err(format!("unknown result kind '{other}'")),
        }
    }
}

impl Evaluation {
    pub fn as_number(&self) -> f64 {
        match self {
            Evaluation::Number(n) => *n,
            Evaluation::Boolean(b) => f64::from(u8::from(*b)),
            Evaluation::String(s) => s.trim().parse().unwrap_or(0.0),
            Evaluation::DateTime(dt) => dt.timestamp_millis() as f64,
            Evaluation::Duration(d) => d.num_milliseconds() as f64,
            Evaluation::Array(_) | Evaluation::Structure(_) | Evaluation::Null => 0.0,
        }
    }

    pub fn as_boolean(&self) -> bool {
        match self {
            Evaluation::Boolean(b) => *b,
            Evaluation::Number(n) => *n != 0.0,
            Evaluation::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Evaluation::Number(n) => number_value(*n).to_string(),
            Evaluation::Boolean(b) => b.to_string(),
            Evaluation::String(s) => s.clone(),
            Evaluation::DateTime(dt) => dt.to_rfc3339(),
            Evaluation::Duration(d) => d.to_string(),
            Evaluation::Null => "null".to_string(),
            other => other.to_value().to_string(),
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Evaluation::DateTime(dt) => Some(*dt),
            Evaluation::Number(n) => DateTime::from_timestamp_millis(*n as i64),
            Evaluation::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Evaluation::Duration(d) => Some(*d),
            Evaluation::Number(n) => Some(TimeDelta::milliseconds(*n as i64)),
            _ => None,
        }
    }

    /// The natural raw value of this result.
    pub fn to_value(&self) -> Value {
        match self {
            Evaluation::Number(n) => number_value(*n),
            Evaluation::Boolean(b) => Value::Bool(*b),
            Evaluation::String(s) => Value::String(s.clone()),
            Evaluation::DateTime(dt) => Value::String(dt.to_rfc3339()),
            Evaluation::Duration(d) => Value::String(d.to_string()),
            Evaluation::Array(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Evaluation::Structure(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Evaluation::Null => Value::Null,
        }
    }

    /// Converts into the requested shape.
    pub fn to_kind(&self, kind: ResultKind) -> Value {
        match kind {
            ResultKind::Number => number_value(self.as_number()),
            ResultKind::Boolean => Value::Bool(self.as_boolean()),
            ResultKind::String => Value::String(self.as_text()),
            ResultKind::DateTime => self
                .as_date_time()
                .map(|dt| Value::String(dt.to_rfc3339()))
                .unwrap_or(Value::Null),
            ResultKind::Duration => self
                .as_duration()
                .map(|d| Value::String(d.to_string()))
                .unwrap_or(Value::Null),
            ResultKind::Array => match self {
                Evaluation::Array(_) => self.to_value(),
                Evaluation::Null => Value::Array(Vec::new()),
                other => Value::Array(vec![other.to_value()]),
            },
            ResultKind::Structure => match self {
                Evaluation::Structure(_) => self.to_value(),
                _ => Value::Object(Map::new()),
            },
            ResultKind::Null => Value::Null,
        }
    }
}

/// Integral results become integers, everything else a float.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// `${math:expression[_KIND]}`.
#[derive(Clone, Default)]
pub struct MathExpression {
    evaluator: Option<Rc<dyn Evaluator>>,
}

impl MathExpression {
    /// A handler with no evaluator; calls fail with
    /// [`SettingsError::MissingEvaluator`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(evaluator: impl Evaluator + 'static) -> Self {
        Self {
            evaluator: Some(Rc::new(evaluator)),
        }
    }
}

impl ExpressionHandler for MathExpression {
    fn evaluate(&self, _root: &Node, _provider: &Node, args: &[String]) -> Result<Value> {
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or(SettingsError::MissingEvaluator)?;
        let expression = args
            .first()
            .ok_or_else(|| SettingsError::missing_argument("math", 0))?;
        let result = evaluator
            .evaluate(expression)
            .map_err(|message| SettingsError::evaluation(expression.clone(), message))?;

        match args.get(1) {
            Some(kind) => {
                let kind = kind
                    .parse::<ResultKind>()
                    .map_err(|reason| SettingsError::invalid_argument("math", kind.clone(), reason))?;
                Ok(result.to_kind(kind))
            }
            None => Ok(result.to_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Adds `+`-separated integers; anything else is an error.
    fn adder(expression: &str) -> std::result::Result<Evaluation, String> {
        expression
            .split('+')
            .map(|part| part.trim().parse::<f64>().map_err(|e| e.to_string()))
            .sum::<std::result::Result<f64, String>>()
            .map(Evaluation::Number)
    }

    fn eval(handler: &MathExpression, args: &[&str]) -> Result<Value> {
        let root = Node::new_map();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        handler.evaluate(&root, &root, &args)
    }

    #[test]
    fn test_missing_evaluator_fails_on_use() {
        let err = eval(&MathExpression::new(), &["1+1"]).unwrap_err();
        assert!(matches!(err, SettingsError::MissingEvaluator));
    }

    #[test]
    fn test_result_kinds() {
        let math = MathExpression::with_evaluator(adder);
        assert_eq!(eval(&math, &["1+2"]).unwrap(), json!(3));
        assert_eq!(eval(&math, &["1+2", "string"]).unwrap(), json!("3"));
        assert_eq!(eval(&math, &["0+0", "BOOLEAN"]).unwrap(), json!(false));
        assert_eq!(eval(&math, &["1+2", "array"]).unwrap(), json!([3]));
        assert_eq!(eval(&math, &["1+2", "structure"]).unwrap(), json!({}));
        assert_eq!(eval(&math, &["1+2", "null"]).unwrap(), Value::Null);
        assert_eq!(eval(&math, &["0.5+1"]).unwrap(), json!(1.5));
    }

    #[test]
    fn test_date_time_and_duration() {
        let math = MathExpression::with_evaluator(adder);
        assert_eq!(
            eval(&math, &["0+1000", "DATE_TIME"]).unwrap(),
            json!("1970-01-01T00:00:01+00:00")
        );
        assert_eq!(eval(&math, &["1500", "DURATION"]).unwrap(), json!("PT1.5S"));
    }

    #[test]
    fn test_evaluation_errors() {
        let math = MathExpression::with_evaluator(adder);
        assert!(matches!(
            eval(&math, &["1+x"]),
            Err(SettingsError::Evaluation { .. })
        ));
        assert!(matches!(
            eval(&math, &["1", "HEX"]),
            Err(SettingsError::InvalidArgument { handler: "math", .. })
        ));
    }
}
