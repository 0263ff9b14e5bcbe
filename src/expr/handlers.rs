//! Built-in expression handlers.

use super::ExpressionHandler;
use crate::error::{Result, SettingsError};
use crate::node::{Node, NodeKind};
use crate::strings;
use serde_json::Value;

fn arg<'a>(args: &'a [String], index: usize, handler: &'static str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| SettingsError::missing_argument(handler, index))
}

fn int_arg(args: &[String], index: usize, handler: &'static str) -> Result<Option<i64>> {
    match args.get(index) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| SettingsError::invalid_argument(handler, raw.clone(), e)),
    }
}

/// `${node:path_arg1_arg2}` returns the value at `path`.
///
/// Extra arguments are substituted into `{N}` tokens of a copy of that
/// value.
pub struct NodeExpression;

impl ExpressionHandler for NodeExpression {
    fn evaluate(&self, root: &Node, _provider: &Node, args: &[String]) -> Result<Value> {
        let node = root.get_split(arg(args, 0, "node")?);
        if args.len() == 1 {
            return Ok(node.value());
        }
        let extra: Vec<Value> = args[1..].iter().cloned().map(Value::String).collect();
        let copy = node.copy();
        copy.replace_args(&extra);
        Ok(copy.value())
    }
}

/// `${size:path}`: entry count of a map or list, `-1` when the value is
/// missing, `1` for any other scalar.
pub struct SizeExpression;

impl ExpressionHandler for SizeExpression {
    fn evaluate(&self, root: &Node, _provider: &Node, args: &[String]) -> Result<Value> {
        let node = root.get_split(arg(args, 0, "size")?);
        let size = match node.kind() {
            NodeKind::Map | NodeKind::List => node.len() as i64,
            NodeKind::Scalar if node.is_empty() => -1,
            NodeKind::Scalar => 1,
        };
        Ok(Value::from(size))
    }
}

/// `${join:path_delim[_start[_end]]}` joins a list's elements.
///
/// `start` past the end yields an empty string; `end` only applies when it
/// lies strictly inside the list. A non-list renders as its text form.
pub struct JoinExpression;

impl ExpressionHandler for JoinExpression {
    fn evaluate(&self, root: &Node, _provider: &Node, args: &[String]) -> Result<Value> {
        let node = root.get_split(arg(args, 0, "join")?);
        let delimiter = arg(args, 1, "join")?;
        if !node.is_list() {
            return Ok(Value::String(strings::text(&node.value())));
        }

        let elements = node.elements();
        let len = elements.len() as i64;
        let start = int_arg(args, 2, "join")?.unwrap_or(0).max(0);
        if start >= len {
            return Ok(Value::String(String::new()));
        }
        let end = match int_arg(args, 3, "join")? {
            Some(end) if end > 0 && end < len => end,
            _ => len,
        };
        let joined = elements
            .iter()
            .take(end as usize)
            .skip(start as usize)
            .map(|element| strings::text(&element.value()))
            .collect::<Vec<_>>()
            .join(delimiter);
        Ok(Value::String(joined))
    }
}

/// `${split:path_delim}` splits the string at `path` into a list; a
/// missing value splits as empty text.
pub struct SplitExpression;

impl ExpressionHandler for SplitExpression {
    fn evaluate(&self, root: &Node, _provider: &Node, args: &[String]) -> Result<Value> {
        let node = root.get_split(arg(args, 0, "split")?);
        let delimiter = arg(args, 1, "split")?;
        let text = node.as_string().unwrap_or_default();
        if delimiter.is_empty() {
            return Ok(Value::Array(vec![Value::String(text)]));
        }
        Ok(Value::Array(
            text.split(delimiter)
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ))
    }
}
