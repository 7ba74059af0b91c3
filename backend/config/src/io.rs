//! Config file location and reading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the LensBridge config directory.
/// Priority: `LENSBRIDGE_CONFIG_DIR` env > `~/.lensbridge/` > `./.lensbridge/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LENSBRIDGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".lensbridge"))
        .unwrap_or_else(|| PathBuf::from(".lensbridge"))
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// An explicit `--config` path wins over the config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Parse JSON or YAML text into a value tree. YAML is a superset of JSON, so
/// one parser covers both.
pub fn parse_config_text(raw: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(raw).context("Config is neither valid YAML nor JSON")?;
    Ok(match value {
        // An empty file parses as null.
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}

/// Read the config file into an unresolved value tree. The file holds the
/// service secrets, so a missing file is an error.
pub async fn load_config_value(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let value = parse_config_text(&raw)
        .with_context(|| format!("Failed to parse config at: {}", path.display()))?;
    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_yaml() {
        let json = parse_config_text(r#"{"server": {"port": 8080}}"#).unwrap();
        let yaml = parse_config_text("server:\n  port: 8080\n").unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn empty_file_is_empty_object() {
        assert!(parse_config_text("").unwrap().as_object().unwrap().is_empty());
    }

    #[test]
    fn explicit_path_wins() {
        let p = resolve_config_path(Some(Path::new("/etc/lensbridge.yaml")));
        assert_eq!(p, PathBuf::from("/etc/lensbridge.yaml"));
        assert!(resolve_config_path(None).ends_with("config.yaml"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_value(&dir.path().join("nope.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }
}
