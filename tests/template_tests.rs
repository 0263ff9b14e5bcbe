//! Integration tests for template resolution and argument substitution.

use serde_json::{Value, json};
use settings_tree::expr::Evaluation;
use settings_tree::{Node, SettingsError, SettingsParser};

#[test]
fn whole_placeholder_resolves_to_typed_value() {
    let root = Node::wrap(json!({"a": 1, "b": "${a}"}));
    SettingsParser::simple().parse(&root).unwrap();
    assert_eq!(root.get("b").as_i32(), Some(1));
    assert_eq!(root.get("b").value(), json!(1));
}

#[test]
fn embedded_placeholder_renders_text() {
    let root = Node::wrap(json!({"a": 1, "c": "x=${a}"}));
    SettingsParser::simple().parse(&root).unwrap();
    assert_eq!(root.get("c").value(), json!("x=1"));
}

#[test]
fn unknown_handler_is_echoed() {
    let root = Node::wrap(json!({"a": "${nope:thing}", "b": "<${nope:thing}>"}));
    SettingsParser::all().parse(&root).unwrap();
    assert_eq!(root.get("a").value(), json!("${nope:thing}"));
    assert_eq!(root.get("b").value(), json!("<${nope:thing}>"));
}

#[test]
fn positional_arguments() {
    let node = Node::wrap(json!({"a": "{0}-{1}", "b": "{5}", "c": "{#}: {*} / {-}"}));
    node.replace_args(&[json!("a"), json!("b")]);
    assert_eq!(node.get("a").value(), json!("a-b"));
    assert_eq!(node.get("b").value(), json!("{5}"));
    assert_eq!(node.get("c").value(), json!("2: [a, b] / a b"));
}

#[test]
fn size_counts_children_or_reports_missing() {
    let root = Node::wrap(json!({
        "list": [1, 2, 3],
        "n": "${size:list}",
        "m": "${size:missing}",
    }));
    SettingsParser::all().parse(&root).unwrap();
    assert_eq!(root.get("n").value(), json!(3));
    assert_eq!(root.get("m").value(), json!(-1));
}

#[test]
fn node_handler_substitutes_arguments() {
    let root = Node::wrap(json!({
        "greeting": "hello {0}, you are {1}",
        "name": "sam",
        "msg": "${node:greeting_$[name]_welcome}",
    }));
    SettingsParser::simple().parse(&root).unwrap();
    assert_eq!(root.get("msg").value(), json!("hello sam, you are welcome"));
}

#[test]
fn join_and_split_handlers() {
    let root = Node::wrap(json!({
        "parts": ["a", "b", "c", "d"],
        "csv": "x,y,,z",
        "joined": "${join:parts_/_1_3}",
        "split": "${split:csv_,}",
    }));
    SettingsParser::all().parse(&root).unwrap();
    assert_eq!(root.get("joined").value(), json!("b/c"));
    assert_eq!(root.get("split").value(), json!(["x", "y", "", "z"]));
}

#[test]
fn math_requires_an_evaluator() {
    let root = Node::wrap(json!({"x": "${math:1+2}"}));
    let err = SettingsParser::all().parse(&root).unwrap_err();
    assert!(matches!(err, SettingsError::MissingEvaluator));

    let parser = SettingsParser::all().with_evaluator(|expr: &str| {
        expr.split('+')
            .map(|part| part.trim().parse::<f64>().map_err(|e| e.to_string()))
            .sum::<Result<f64, String>>()
            .map(Evaluation::Number)
    });
    parser.parse(&root).unwrap();
    assert_eq!(root.get("x").value(), json!(3));
}

#[test]
fn extends_builds_from_template() {
    let root = Node::wrap(json!({
        "base": {"host": "{host}", "port": 80},
        "web": {"extends": "base", "host": "example.org"},
        "url": "http://${web.host}:${web.port}",
    }));
    SettingsParser::all().parse(&root).unwrap();
    assert_eq!(root.get("web").value(), json!({"host": "example.org", "port": 80}));
    assert_eq!(root.get("url").value(), Value::from("http://example.org:80"));
}
