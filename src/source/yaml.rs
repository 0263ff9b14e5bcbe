//! YAML documents with `#` comments.
//!
//! Comment lines directly above a mapping key become that node's top
//! comment and a trailing `# ...` after a scalar becomes its side comment.
//! Only block mappings are tracked; comments inside flow collections and
//! list items are dropped.

use super::{SettingsSource, document_root};
use crate::error::SourceError;
use crate::node::Node;
use serde_json::{Map, Number, Value};

pub struct YamlSource;

impl SettingsSource for YamlSource {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn comment_prefix(&self) -> Option<&'static str> {
        Some("#")
    }

    fn read(&self, text: &str) -> Result<Node, SourceError> {
        let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
        let root = document_root(to_json(raw))?;
        self.read_comments(&root, text);
        Ok(root)
    }

    fn write(&self, node: &Node) -> Result<String, SourceError> {
        let mut out = String::new();
        if let Some(lines) = node.top_comment() {
            out.push_str(&self.write_comment(&lines, 0));
        }
        self.write_map(node, 0, &mut out)?;
        Ok(out)
    }
}

impl YamlSource {
    fn read_comments(&self, root: &Node, text: &str) {
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                pending.push(trimmed);
                continue;
            }
            if trimmed.is_empty() || trimmed == "---" {
                continue;
            }
            let Some((key, rest)) = mapping_key(trimmed) else {
                pending.clear();
                continue;
            };

            let indent = line.len() - trimmed.len();
            while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
                stack.pop();
            }
            stack.push((indent, key));

            let path: Vec<&str> = stack.iter().map(|(_, k)| k.as_str()).collect();
            let node = root.get_path(&path);
            if node.is_attached() {
                if !pending.is_empty() {
                    node.set_top_comment(Some(self.read_comment(&pending)));
                }
                if let Some(side) = side_comment(rest) {
                    node.set_side_comment(Some(vec![side]));
                }
            }
            pending.clear();
        }
    }

    fn write_map(&self, node: &Node, indent: usize, out: &mut String) -> Result<(), SourceError> {
        let pad = " ".repeat(indent);
        for (key, child) in node.entries() {
            if let Some(lines) = child.top_comment() {
                out.push_str(&self.write_comment(&lines, indent));
            }
            let side = child
                .side_comment()
                .filter(|lines| !lines.is_empty())
                .map(|lines| format!(" # {}", lines.join(" ")));

            if child.is_map() && child.len() > 0 {
                let rendered_key = serde_yaml::to_string(&key)?;
                out.push_str(&pad);
                out.push_str(rendered_key.trim_end());
                out.push(':');
                out.push_str(side.as_deref().unwrap_or(""));
                out.push('\n');
                self.write_map(&child, indent + 2, out)?;
                continue;
            }

            let mut single = Map::new();
            single.insert(key, child.value());
            let rendered = serde_yaml::to_string(&single)?;
            for (i, line) in rendered.lines().enumerate() {
                out.push_str(&pad);
                out.push_str(line);
                if i == 0 && child.is_scalar() {
                    out.push_str(side.as_deref().unwrap_or(""));
                }
                out.push('\n');
            }
        }
        Ok(())
    }
}

/// Splits `key: rest` from a block mapping line.
fn mapping_key(line: &str) -> Option<(String, &str)> {
    if line.starts_with(['-', '#', '[', '{', '|', '>']) {
        return None;
    }
    if let Some(quote) = line.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let close = line[1..].find(quote)? + 1;
        let rest = line[close + 1..].strip_prefix(':')?;
        if !rest.is_empty() && !rest.starts_with(' ') {
            return None;
        }
        return Some((line[1..close].to_string(), rest));
    }

    let mut search = 0;
    while let Some(i) = line[search..].find(':').map(|i| i + search) {
        let rest = &line[i + 1..];
        if rest.is_empty() || rest.starts_with(' ') {
            let key = line[..i].trim_end();
            return (!key.is_empty()).then(|| (key.to_string(), rest));
        }
        search = i + 1;
    }
    None
}

/// Trailing `# comment` after a scalar value, ignoring `#` inside quotes.
fn side_comment(rest: &str) -> Option<String> {
    let value = rest.trim_start();
    if let Some(comment) = value.strip_prefix('#') {
        return Some(comment.trim().to_string());
    }
    let scan_from = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => value[1..].find(quote).map(|i| i + 2)?,
        _ => 0,
    };
    let hash = value[scan_from..].find(" #")? + scan_from;
    Some(value[hash + 2..].trim().to_string())
}

fn key_text(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Converts a YAML value, stringifying non-string map keys.
fn to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (key_text(k), to_json(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => to_json(tagged.value),
    }
}
