//! Get command: prints the value at a dotted path.

use super::load;
use crate::loader::SettingsLoader;
use crate::strings;
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Settings file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dotted path; escape literal dots with a backslash
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Defaults file used to fill missing keys
    #[arg(short, long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,
}

/// Scalars print in text form, maps and lists as pretty JSON.
pub fn run_get(loader: &SettingsLoader, args: &GetArgs) -> Result<String> {
    let loaded = load(loader, &args.file, args.defaults.as_deref())?;
    let node = loaded.settings.get_split(&args.path);
    if !node.has_value() {
        bail!("No value at '{}' in {}", args.path, args.file.display());
    }
    if node.is_scalar() {
        return Ok(strings::text(&node.value()));
    }
    Ok(serde_json::to_string_pretty(&node.value())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_get_scalar_and_map() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "app.yaml", "server:\n  port: 8080\n  url: \"http://h:${server.port}\"\n");
        let loader = SettingsLoader::new();

        let args = GetArgs {
            file: file.clone(),
            path: "server.url".into(),
            defaults: None,
        };
        assert_eq!(run_get(&loader, &args).unwrap(), "http://h:8080");

        let args = GetArgs {
            file,
            path: "server".into(),
            defaults: None,
        };
        assert_eq!(
            run_get(&loader, &args).unwrap(),
            "{\n  \"port\": 8080,\n  \"url\": \"http://h:8080\"\n}"
        );
    }

    #[test]
    fn test_get_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "app.json", "{\"a\": 1}");
        let args = GetArgs {
            file,
            path: "b".into(),
            defaults: None,
        };
        assert!(run_get(&SettingsLoader::new(), &args).is_err());
    }

    #[test]
    fn test_get_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "app.json", "{}");
        let defaults = write(&dir, "base.toml", "timeout = 30\n");
        let args = GetArgs {
            file,
            path: "timeout".into(),
            defaults: Some(defaults),
        };
        assert_eq!(run_get(&SettingsLoader::new(), &args).unwrap(), "30");
    }
}
