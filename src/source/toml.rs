use super::{SettingsSource, document_root};
use crate::error::SourceError;
use crate::node::Node;
use serde_json::{Number, Value};

/// TOML documents. Datetimes read as strings; `null` values are dropped
/// on write since TOML has no null.
pub struct TomlSource;

impl SettingsSource for TomlSource {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn read(&self, text: &str) -> Result<Node, SourceError> {
        let table: ::toml::Table = ::toml::from_str(text)?;
        document_root(to_json(::toml::Value::Table(table)))
    }

    fn write(&self, node: &Node) -> Result<String, SourceError> {
        Ok(::toml::to_string(&without_nulls(node.value()))?)
    }
}

fn to_json(value: ::toml::Value) -> Value {
    match value {
        ::toml::Value::String(s) => Value::String(s),
        ::toml::Value::Integer(i) => Value::from(i),
        ::toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        ::toml::Value::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        ::toml::Value::Table(table) => Value::Object(
            table.into_iter().map(|(k, v)| (k, to_json(v))).collect(),
        ),
    }
}

fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_tables_and_datetimes() {
        let node = TomlSource
            .read("name = \"app\"\nwhen = 1979-05-27T07:32:00Z\n\n[server]\nport = 8080\nratio = 0.5\n")
            .unwrap();
        assert_eq!(
            node.value(),
            json!({
                "name": "app",
                "when": "1979-05-27T07:32:00Z",
                "server": {"port": 8080, "ratio": 0.5},
            })
        );
    }

    #[test]
    fn test_write_drops_nulls() {
        let node = Node::wrap(json!({"a": 1, "b": null, "t": {"c": "x"}}));
        let text = TomlSource.write(&node).unwrap();
        let back = TomlSource.read(&text).unwrap();
        assert_eq!(back.value(), json!({"a": 1, "t": {"c": "x"}}));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TomlSource.read("a = "),
            Err(SourceError::TomlRead(_))
        ));
    }
}
