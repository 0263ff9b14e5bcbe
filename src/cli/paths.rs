use super::load;
use crate::loader::SettingsLoader;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the paths command.
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Settings file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Defaults file used to fill missing keys
    #[arg(short, long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,
}

/// One dotted path per line; dots inside keys are escaped.
pub fn run_paths(loader: &SettingsLoader, args: &PathsArgs) -> Result<String> {
    let loaded = load(loader, &args.file, args.defaults.as_deref())?;
    let lines: Vec<String> = loaded
        .root()
        .paths()
        .iter()
        .map(|path| {
            path.iter()
                .map(|key| key.replace('.', "\\."))
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_listing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        std::fs::write(&file, r#"{"a": {"b": 1, "c.d": [1, 2]}, "e": null}"#).unwrap();
        let args = PathsArgs {
            file,
            defaults: None,
        };
        assert_eq!(
            run_paths(&SettingsLoader::new(), &args).unwrap(),
            "a.b\na.c\\.d\ne"
        );
    }
}
