//! String helpers shared by lookups, argument substitution and templates.

use serde_json::{Map, Value};
use std::ops::Range;

/// Splits `input` at every `separator`, treating `\<separator>` as a literal.
///
/// A backslash in front of any other character is kept as-is.
pub fn split_escaped(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&separator) {
            current.push(separator);
            chars.next();
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Splits expression content into arguments at `_`.
///
/// Separators inside `$[...]` sub-expressions are left alone so the nested
/// expression can split its own arguments later; `\_` is a literal
/// underscore.
pub fn split_args(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == '\\' && next == Some('_') {
            if depth > 0 {
                current.push('\\');
            }
            current.push('_');
            i += 2;
        } else if c == '$' && next == Some('[') {
            depth += 1;
            current.push_str("$[");
            i += 2;
        } else if c == ']' && depth > 0 {
            depth -= 1;
            current.push(']');
            i += 1;
        } else if c == '_' && depth == 0 {
            parts.push(std::mem::take(&mut current));
            i += 1;
        } else {
            current.push(c);
            i += 1;
        }
    }
    parts.push(current);
    parts
}

/// A `${...}` or `$[...]` occurrence inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte range of the whole token, delimiters included.
    pub range: Range<usize>,
    /// Text between the delimiters.
    pub content: &'a str,
}

/// Finds `${content}` tokens, left to right. Empty `${}` is not a token.
pub fn find_placeholders(input: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut offset = 0;

    while let Some(start) = input[offset..].find("${").map(|i| i + offset) {
        let body = start + 2;
        let Some(end) = input[body..].find('}').map(|i| i + body) else {
            break;
        };
        if end > body {
            found.push(Placeholder {
                range: start..end + 1,
                content: &input[body..end],
            });
            offset = end + 1;
        } else {
            offset = body;
        }
    }
    found
}

/// Finds `$[content]` tokens with balanced nesting, left to right.
pub fn find_sub_placeholders(input: &str) -> Vec<Placeholder<'_>> {
    let bytes = input.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'[' {
            let body = i + 2;
            let mut depth = 1usize;
            let mut j = body;
            while j < bytes.len() {
                match bytes[j] {
                    b'$' if bytes.get(j + 1) == Some(&b'[') => {
                        depth += 1;
                        j += 1;
                    }
                    b']' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            if depth != 0 {
                break;
            }
            if j > body {
                found.push(Placeholder {
                    range: i..j + 1,
                    content: &input[body..j],
                });
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
    found
}

/// Renders a raw value the way it appears inside substituted text.
///
/// Strings render bare, lists as `[a, b]`, maps as `{k=v, k2=v2}` and a
/// missing value as `null`.
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(text).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}={}", k, text(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Returns `N` when `input` is exactly `{N}`.
pub fn whole_index_token(input: &str) -> Option<usize> {
    let inner = input.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// Returns `key` when `input` is exactly `{key}`.
pub fn whole_named_token(input: &str) -> Option<&str> {
    let inner = input.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner)
}

/// Substitutes positional tokens.
///
/// `{N}` becomes the text of `args[N]` and stays literal when out of range.
/// `{*}` renders all arguments as `[a, b]`, `{-}` joins them with spaces and
/// `{#}` is the argument count.
pub fn replace_args(input: &str, args: &[Value]) -> String {
    if args.is_empty() || !input.contains('{') {
        return input.to_string();
    }

    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && chars[j].is_ascii_digit() {
            j += 1;
        }
        if j > i + 1 && chars.get(j) == Some(&'}') {
            let digits: String = chars[i + 1..j].iter().collect();
            match digits.parse::<usize>().ok().and_then(|n| args.get(n)) {
                Some(arg) => out.push_str(&text(arg)),
                None => out.extend(&chars[i..=j]),
            }
            i = j + 1;
            continue;
        }

        if j == i + 1 && chars.get(i + 2) == Some(&'}') {
            let rendered = match chars[i + 1] {
                '*' => Some(format!(
                    "[{}]",
                    args.iter().map(text).collect::<Vec<_>>().join(", ")
                )),
                '-' => Some(args.iter().map(text).collect::<Vec<_>>().join(" ")),
                '#' => Some(args.len().to_string()),
                _ => None,
            };
            if let Some(rendered) = rendered {
                out.push_str(&rendered);
                i += 3;
                continue;
            }
        }

        out.push('{');
        i += 1;
    }
    out
}

/// Substitutes `{key}` tokens from a named map.
///
/// Unknown keys stay literal. A `{` inside an open token restarts the
/// token there, so `{a}{b}` and `{{a}` both resolve `a`.
pub fn replace_named_args(input: &str, args: &Map<String, Value>) -> String {
    if args.is_empty() || !input.contains('{') {
        return input.to_string();
    }

    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && chars[j] != '}' && chars[j] != '{' {
            j += 1;
        }
        match chars.get(j) {
            Some('}') => {
                let key: String = chars[i + 1..j].iter().collect();
                match args.get(&key).filter(|v| !v.is_null()) {
                    Some(arg) if !key.is_empty() => out.push_str(&text(arg)),
                    _ => out.extend(&chars[i..=j]),
                }
                i = j + 1;
            }
            Some(_) => {
                out.extend(&chars[i..j]);
                i = j;
            }
            None => {
                out.extend(&chars[i..]);
                i = chars.len();
            }
        }
    }
    out
}
