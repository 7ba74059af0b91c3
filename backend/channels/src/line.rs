/// LINE adapter: receives webhook events from the LINE Messaging API.
/// Image messages are queued for the pipeline; text messages get an upload
/// prompt through the Reply API.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use lensbridge_core::ImageEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::line_receive::{parse_webhook, verify_signature, InboundEvent, WebhookEvent, SIGNATURE_HEADER};
use crate::line_send::LineMessenger;
use crate::ChannelAdapter;

pub const UPLOAD_PROMPT: &str =
    "Please send me an image and I will run face, text and caption analysis on it!";

const INFO_PAGE: &str = "<h3>LensBridge: LINE image analysis bot</h3>\n\
<span>Send an image to this bot in LINE to receive annotated faces, recognized text and a caption.</span>\n";

#[derive(Clone)]
pub struct LineConfig {
    pub channel_secret: String,
    pub webhook_path: String,
}

pub struct LineAdapter {
    config: LineConfig,
    messenger: Arc<LineMessenger>,
    image_tx: mpsc::Sender<ImageEvent>,
}

impl LineAdapter {
    pub fn new(
        config: LineConfig,
        messenger: Arc<LineMessenger>,
        image_tx: mpsc::Sender<ImageEvent>,
    ) -> Self {
        Self { config, messenger, image_tx }
    }
}

#[derive(Clone)]
struct AppState {
    channel_secret: Arc<str>,
    messenger: Arc<LineMessenger>,
    image_tx: mpsc::Sender<ImageEvent>,
}

async fn info_page() -> Html<&'static str> {
    Html(INFO_PAGE)
}

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // 1. Authenticity
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if let Err(e) = verify_signature(&state.channel_secret, signature, &body) {
        warn!(error = %e, "[LINE] Rejecting webhook; check the channel secret");
        return (StatusCode::BAD_REQUEST, "invalid_signature");
    }

    // 2. Payload
    let payload = match parse_webhook(&body) {
        Ok(p) => p,
        Err(err) => {
            error!("[LINE] Failed to parse webhook body: {}", err);
            return (StatusCode::BAD_REQUEST, "bad_json");
        }
    };
    debug!(events = payload.events.len(), destination = ?payload.destination, "[LINE] Webhook received");

    // 3. Dispatch
    for event in payload.events {
        dispatch(&state, event);
    }
    (StatusCode::OK, "OK")
}

fn dispatch(state: &AppState, event: WebhookEvent) {
    match event.classify() {
        InboundEvent::Image(image) => {
            let message_id = image.message_id.clone();
            match state.image_tx.try_send(image) {
                Ok(()) => info!(%message_id, "[LINE] Image queued"),
                Err(TrySendError::Full(_)) => {
                    warn!(%message_id, "[LINE] Image queue full; dropping image")
                }
                Err(TrySendError::Closed(_)) => {
                    error!(%message_id, "[LINE] Image worker is gone; dropping image")
                }
            }
        }
        InboundEvent::Text { reply_token: Some(token), text } => {
            debug!("[LINE] Text message: {}", text);
            let messenger = state.messenger.clone();
            tokio::spawn(async move {
                if let Err(e) = messenger.reply_text(&token, UPLOAD_PROMPT).await {
                    warn!(error = %e, "[LINE] Failed to send upload prompt");
                }
            });
        }
        InboundEvent::Text { reply_token: None, .. } => {
            debug!("[LINE] Text message without reply token");
        }
        InboundEvent::Ignored { kind } => debug!(%kind, "[LINE] Ignoring event"),
    }
}

#[async_trait]
impl ChannelAdapter for LineAdapter {
    fn name(&self) -> &str {
        "line"
    }

    fn build_router(&self) -> Router {
        let state = AppState {
            channel_secret: Arc::from(self.config.channel_secret.as_str()),
            messenger: self.messenger.clone(),
            image_tx: self.image_tx.clone(),
        };
        Router::new()
            .route(&self.config.webhook_path, get(info_page).post(webhook_handler))
            .with_state(state)
    }

    async fn start(&self) -> Result<()> {
        info!("[LINE] Adapter ready at {}", self.config.webhook_path);
        Ok(())
    }
}
