//! Integration tests for loading, migrating and saving settings files.

use serde_json::json;
use settings_tree::config::{EngineConfig, ParserPreset};
use settings_tree::{Node, NodeUpdate, SettingsLoader, SettingsUpdater};
use std::path::PathBuf;
use tempfile::TempDir;

const DEFAULTS: &str = "\
# Network settings
server:
  host: localhost
  port: 8080 # listen port
  url: \"http://${server.host}:${server.port}\"
retries: 3
";

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn defaults(loader: &SettingsLoader) -> Node {
    loader.read_str("yaml", DEFAULTS).unwrap()
}

#[test]
fn missing_file_loads_defaults_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SettingsLoader::new();
    let defaults = defaults(&loader);

    let loaded = loader
        .load_file(dir.path().join("app.yaml"), Some(&defaults))
        .unwrap();
    assert!(loaded.changed);
    assert_eq!(
        loaded.settings.get_split("server.url").value(),
        json!("http://localhost:8080")
    );
    assert_eq!(loaded.settings.get("retries").as_i32(), Some(3));
    assert!(!dir.path().join("app.yaml").exists());
}

#[test]
fn save_on_update_keeps_templates_and_comments() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "app.yaml", "server:\n  host: example.org\n");
    let loader = SettingsLoader::new().with_save_on_update(true);
    let defaults = defaults(&loader);

    let loaded = loader.load_file(&path, Some(&defaults)).unwrap();
    assert_eq!(
        loaded.settings.get_split("server.url").value(),
        json!("http://example.org:8080")
    );

    let saved = loader.read_file(&path).unwrap();
    assert_eq!(
        saved.value(),
        json!({
            "server": {
                "host": "example.org",
                "port": 8080,
                "url": "http://${server.host}:${server.port}",
            },
            "retries": 3,
        })
    );
    assert_eq!(
        saved.get_split("server.port").side_comment(),
        Some(vec!["listen port".to_string()])
    );

    let again = loader.load_file(&path, Some(&defaults)).unwrap();
    assert!(!again.changed);
}

#[test]
fn migration_rules_rename_and_fill() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "app.json", r#"{"Old_Name": "svc", "legacy": {"flag": "yes"}}"#);
    let updater = SettingsUpdater::new(vec![
        NodeUpdate::move_node().from_ignore_case(["old_name"]).to(["name"]),
        NodeUpdate::move_node().from_split("legacy.flag").to(["enabled"]),
        NodeUpdate::add(10).from(["limits", "max"]),
    ]);
    let loader = SettingsLoader::new()
        .with_updater(updater)
        .with_save_on_update(true);

    let loaded = loader.load_file(&path, None).unwrap();
    assert!(loaded.changed);
    assert_eq!(
        loaded.root().value(),
        json!({"name": "svc", "enabled": "yes", "limits": {"max": 10}})
    );
    assert_eq!(loaded.settings.get("enabled").as_bool(), Some(true));

    let reread = loader.read_file(&path).unwrap();
    assert_eq!(reread.value(), loaded.root().value());
}

#[test]
fn config_controls_parser_and_memoization() {
    let config = EngineConfig {
        parser: ParserPreset::Empty,
        memoize: true,
        ..Default::default()
    };
    let loaded = config
        .build_loader()
        .load_str("toml", "a = 1\nb = \"${a}\"\n", None)
        .unwrap();
    assert_eq!(loaded.settings.get("b").value(), json!("${a}"));
    assert!(loaded.settings.is_memorizing());
}

#[test]
fn toml_output_of_resolved_tree() {
    let loader = SettingsLoader::new();
    let loaded = loader
        .load_str("json", r#"{"name": "x", "db": {"size": "${size:db.hosts}", "hosts": ["a", "b"]}}"#, None)
        .unwrap();
    assert_eq!(
        loader.save_str("toml", loaded.root()).unwrap(),
        "name = \"x\"\n\n[db]\nsize = 2\nhosts = [\"a\", \"b\"]\n"
    );
}
