//! Builds the pipeline's service objects from the loaded config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use lensbridge_channels::{load_flex_template, LineMessenger};
use lensbridge_config::{BridgeConfig, PollConfig};
use lensbridge_media::{AnnotationRenderer, ImgurCredentials, ImgurHost, StagingArea};
use lensbridge_pipeline::{ComposerSettings, ResponseComposer, Services};
use lensbridge_understanding::{AzureCredentials, AzureFaceClient, ComputerVisionClient, PollPolicy};

pub struct Wired {
    pub composer: ResponseComposer,
    /// Shared with the webhook for prompt replies.
    pub messenger: Arc<LineMessenger>,
}

/// One connection pool for every upstream. `timeout` bounds each request
/// from connect to the last body byte.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub async fn build(config: &BridgeConfig) -> Result<Wired> {
    let http = http_client(config.pipeline.http_timeout())?;
    info!(timeout_ms = config.pipeline.http_timeout_ms, "HTTP client ready");

    let mut messenger =
        LineMessenger::new(config.line.channel_access_token.clone(), http.clone());
    if let Some(path) = &config.pipeline.flex_template_path {
        messenger = messenger.with_flex_template(load_flex_template(path)?);
        info!(path = %path.display(), "Loaded flex template");
    }
    let messenger = Arc::new(messenger);

    let host = ImgurHost::new(
        ImgurCredentials {
            client_id: config.imgur.client_id.clone(),
            access_token: config.imgur.access_token.clone(),
        },
        http.clone(),
    );
    let faces = AzureFaceClient::new(
        AzureCredentials::new(config.azure_face.endpoint.clone(), config.azure_face.key.clone()),
        http.clone(),
    );
    let vision = Arc::new(ComputerVisionClient::new(
        AzureCredentials::new(config.azure_cv.endpoint.clone(), config.azure_cv.key.clone()),
        http,
    ));

    let renderer = match &config.pipeline.font_path {
        Some(path) => AnnotationRenderer::from_font_file(path)
            .with_context(|| format!("Failed to load label font {}", path.display()))?,
        None => {
            warn!("No label font configured; face labels will be drawn without text");
            AnnotationRenderer::default()
        }
    };

    let staging = StagingArea::new(&config.pipeline.staging_dir);
    staging.ensure().await?;
    info!(dir = %staging.root().display(), "Staging directory ready");

    let services = Services {
        content: messenger.clone(),
        messenger: messenger.clone(),
        host: Arc::new(host),
        faces: Arc::new(faces),
        reader: vision.clone(),
        describer: vision,
    };
    let settings = ComposerSettings {
        person_group_id: config.azure_face.person_group_id.clone(),
        poll: poll_policy(&config.pipeline.poll),
    };

    Ok(Wired {
        composer: ResponseComposer::new(services, renderer, staging, settings),
        messenger,
    })
}

/// Backoff multiplier is fixed; the rest comes from config.
pub fn poll_policy(poll: &PollConfig) -> PollPolicy {
    PollPolicy {
        initial_delay: poll.initial_delay(),
        max_delay: poll.max_delay(),
        max_attempts: poll.max_attempts,
        timeout: poll.timeout(),
        ..PollPolicy::default()
    }
}
