//! Map inheritance through an `extends` key.

use super::NodeParser;
use crate::error::Result;
use crate::node::Node;
use serde_json::Value;
use tracing::{debug, warn};

/// Replaces a map holding `extends: <path>` with the template map at
/// `path`, using the original entries as named `{key}` arguments.
pub struct ExtendsParser;

pub const EXTENDS_KEY: &str = "extends";

impl NodeParser for ExtendsParser {
    fn parse(&self, root: &Node, node: &Node) -> Result<()> {
        let Some(path) = node.child(EXTENDS_KEY).and_then(|n| n.as_string()) else {
            return Ok(());
        };
        let template = root.get_split(&path);
        if !template.is_map() {
            warn!(path = %path, "extends target is not a map");
            return Ok(());
        }
        if template.ptr_eq(node) {
            return Ok(());
        }

        let Value::Object(args) = node.value() else {
            return Ok(());
        };
        debug!(path = %path, key = ?node.key(), "Extending map from template");
        node.set_value(template.value());
        node.replace_named_args(&args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SettingsParser;
    use serde_json::json;

    #[test]
    fn test_extends_fills_template() {
        let root = Node::wrap(json!({
            "templates": {"user": {"greeting": "Hello {name}", "name": "{name}", "admin": false}},
            "bob": {"extends": "templates.user", "name": "Bob"},
        }));
        SettingsParser::all().parse(&root).unwrap();
        assert_eq!(
            root.get("bob").value(),
            json!({"greeting": "Hello Bob", "name": "Bob", "admin": false})
        );
        assert_eq!(
            root.get_split("templates.user.greeting").value(),
            json!("Hello {name}")
        );
    }

    #[test]
    fn test_missing_template_is_ignored() {
        let root = Node::wrap(json!({"a": {"extends": "nowhere", "x": 1}}));
        ExtendsParser.parse(&root, &root.get("a")).unwrap();
        assert_eq!(root.get("a").value(), json!({"extends": "nowhere", "x": 1}));
    }

    #[test]
    fn test_nested_maps_are_extended() {
        let root = Node::wrap(json!({
            "base": {"port": "{port}"},
            "servers": {"one": {"extends": "base", "port": 80}},
        }));
        SettingsParser::all().parse(&root).unwrap();
        assert_eq!(root.get_split("servers.one.port").value(), json!(80));
    }
}
