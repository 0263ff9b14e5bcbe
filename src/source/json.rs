use super::{SettingsSource, document_root};
use crate::error::SourceError;
use crate::node::Node;

/// JSON documents. Comments are not supported.
pub struct JsonSource;

impl SettingsSource for JsonSource {
    fn format(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read(&self, text: &str) -> Result<Node, SourceError> {
        if text.trim().is_empty() {
            return Ok(Node::new_map());
        }
        document_root(serde_json::from_str(text)?)
    }

    fn write(&self, node: &Node) -> Result<String, SourceError> {
        let mut text = serde_json::to_string_pretty(&node.value())?;
        text.push('\n');
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_preserves_order() {
        let node = JsonSource.read(r#"{"z": 1, "a": {"y": [1, 2]}}"#).unwrap();
        assert_eq!(node.keys(), vec!["z", "a"]);
        assert_eq!(node.get_split("a.y").value(), json!([1, 2]));
    }

    #[test]
    fn test_non_map_document_rejected() {
        assert!(matches!(
            JsonSource.read("[1, 2]"),
            Err(SourceError::NotAMap("list"))
        ));
        assert!(JsonSource.read("{").is_err());
        assert_eq!(JsonSource.read("").unwrap().len(), 0);
    }

    #[test]
    fn test_write() {
        let node = Node::wrap(json!({"a": 1}));
        assert_eq!(JsonSource.write(&node).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
