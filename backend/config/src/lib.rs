//! `lensbridge-config`: runtime configuration for the LINE image bridge.
//!
//! Provides:
//! - Typed config schema (LINE, Imgur, Azure Face, Azure Computer Vision, pipeline)
//! - JSON / YAML reading and config path resolution
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Validation with errors and warnings

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config_value, parse_config_text, resolve_config_path};
pub use redact::redact;
pub use schema::{
    AzureCvConfig, AzureFaceConfig, BridgeConfig, ImgurConfig, LineConfig, LoggingConfig,
    PipelineConfig, PollConfig, ServerConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Turn a raw value tree into a typed config: env substitution, then
/// deserialization with defaults.
pub fn prepare_value(value: &Value) -> Result<BridgeConfig> {
    let resolved = resolve_env_vars(value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(resolved).context("Config does not match the expected schema")
}

/// Load a config file and turn it into a typed config. Not validated yet:
/// callers start logging from it first, then call [`ensure_valid`].
pub async fn load_and_prepare(path: &Path) -> Result<BridgeConfig> {
    let value = load_config_value(path).await?;
    prepare_value(&value).with_context(|| format!("Invalid config {}", path.display()))
}

/// Log every warning and error in the config; fail if there are errors.
pub fn ensure_valid(config: &BridgeConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("{} config error(s); run `lensbridge check-config`", report.errors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
line:
  channelSecret: sec
  channelAccessToken: tok
imgur:
  clientId: cid
azureFace:
  endpoint: https://face.example.com/
  key: fk
  personGroupId: friends
azureCv:
  endpoint: https://cv.example.com/
  key: ck
server:
  port: 8080
"#;

    #[tokio::test]
    async fn loads_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, COMPLETE).unwrap();
        let config = load_and_prepare(&path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.azure_face.person_group_id, "friends");
        assert!(ensure_valid(&config).is_ok());
    }

    #[tokio::test]
    async fn incomplete_file_loads_but_is_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"port": 8080}}"#).unwrap();
        let config = load_and_prepare(&path).await.unwrap();
        let err = ensure_valid(&config).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[tokio::test]
    async fn missing_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_and_prepare(&dir.path().join("absent.yaml")).await.is_err());
    }

    #[test]
    fn wrong_types_are_schema_errors() {
        let value = parse_config_text("server:\n  port: not-a-number\n").unwrap();
        assert!(prepare_value(&value).is_err());
    }
}
