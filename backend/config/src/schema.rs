//! Typed configuration schema.
//!
//! Keys are camelCase. The snake_case section and key names of the older
//! `secretFile.json` layout (`azure_face`, `client_id`, ...) are accepted as
//! aliases, so an existing secrets file parses as is. That layout has no
//! person group, so `azureFace.personGroupId` still has to be added before it
//! validates.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub imgur: ImgurConfig,
    #[serde(default, alias = "azure_face")]
    pub azure_face: AzureFaceConfig,
    #[serde(default, alias = "azure_cv")]
    pub azure_cv: AzureCvConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path serving both the LINE webhook (POST) and the info page (GET).
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), port: default_port(), webhook_path: default_webhook_path() }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_webhook_path() -> String {
    "/".to_string()
}

// ---------------------------------------------------------------------------
// Remote services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    #[serde(default, alias = "channel_secret")]
    pub channel_secret: String,
    #[serde(default, alias = "channel_access_token")]
    pub channel_access_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImgurConfig {
    #[serde(default, alias = "client_id")]
    pub client_id: String,
    #[serde(default, alias = "client_secret", skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// When set, uploads go to the owner's account instead of anonymously.
    #[serde(default, alias = "access_token", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureFaceConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, alias = "person_group_id")]
    pub person_group_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCvConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub key: String,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// TTF/OTF used for face labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Flex bubble layout with `hero.url`, `hero.action.uri` and
    /// `body.contents[0].text` slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_template_path: Option<PathBuf>,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Per-request limit for every outbound HTTP call.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            font_path: None,
            flex_template_path: None,
            queue_depth: default_queue_depth(),
            http_timeout_ms: default_http_timeout_ms(),
            poll: PollConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./image")
}

fn default_queue_depth() -> usize {
    32
}

fn default_http_timeout_ms() -> u64 {
    20_000
}

/// Read-job polling budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PollConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    4_000
}

fn default_max_attempts() -> u32 {
    30
}

fn default_timeout_ms() -> u64 {
    30_000
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Directory for the rolling NDJSON log. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), dir: None }
    }
}

fn default_level() -> String {
    "info".to_string()
}
