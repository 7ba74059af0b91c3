//! Config validation: every problem found in one pass, with field paths.

use crate::schema::BridgeConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn require(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.error(path, "Required value is empty");
        }
    }

    fn check_endpoint(&mut self, path: &str, endpoint: &str) {
        if endpoint.trim().is_empty() {
            self.error(path, "Required value is empty");
        } else if !endpoint.starts_with("https://") {
            self.warn(path, "Endpoint is not https; the subscription key travels in clear text");
        }
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BridgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_services(config, &mut report);
    validate_pipeline(config, &mut report);
    report
}

fn validate_server(config: &BridgeConfig, report: &mut ValidationReport) {
    if !config.server.webhook_path.starts_with('/') {
        report.error("server.webhookPath", "Must start with '/'");
    }
    if config.server.webhook_path == "/api/health" {
        report.error("server.webhookPath", "Collides with the health route");
    }
    if config.server.port == 0 {
        report.warn("server.port", "Port 0 binds a random port");
    }
}

fn validate_services(config: &BridgeConfig, report: &mut ValidationReport) {
    report.require("line.channelSecret", &config.line.channel_secret);
    report.require("line.channelAccessToken", &config.line.channel_access_token);

    let has_token = config.imgur.access_token.as_deref().is_some_and(|t| !t.is_empty());
    if config.imgur.client_id.trim().is_empty() && !has_token {
        report.error("imgur.clientId", "Either clientId or accessToken is required");
    }

    report.check_endpoint("azureFace.endpoint", &config.azure_face.endpoint);
    report.require("azureFace.key", &config.azure_face.key);
    report.require("azureFace.personGroupId", &config.azure_face.person_group_id);

    report.check_endpoint("azureCv.endpoint", &config.azure_cv.endpoint);
    report.require("azureCv.key", &config.azure_cv.key);
}

fn validate_pipeline(config: &BridgeConfig, report: &mut ValidationReport) {
    let pipeline = &config.pipeline;
    if pipeline.queue_depth == 0 {
        report.error("pipeline.queueDepth", "Must be at least 1");
    }
    if pipeline.http_timeout_ms == 0 {
        report.error("pipeline.httpTimeoutMs", "Must be greater than 0");
    }

    match &pipeline.font_path {
        None => report.warn("pipeline.fontPath", "No label font; face labels are drawn without text"),
        Some(path) if !path.exists() => {
            report.error("pipeline.fontPath", format!("Font file not found: {}", path.display()))
        }
        Some(_) => {}
    }
    if let Some(path) = &pipeline.flex_template_path {
        if !path.exists() {
            report.error(
                "pipeline.flexTemplatePath",
                format!("Template file not found: {}", path.display()),
            );
        }
    }

    let poll = &pipeline.poll;
    if poll.max_attempts == 0 {
        report.warn("pipeline.poll.maxAttempts", "0 attempts still polls once");
    }
    if poll.timeout_ms == 0 {
        report.error("pipeline.poll.timeoutMs", "Must be greater than 0");
    }
    if poll.initial_delay_ms > poll.max_delay_ms {
        report.warn("pipeline.poll.initialDelayMs", "Greater than maxDelayMs; maxDelayMs applies");
    }
}
