//! LINE Webhook Receiver
//!
//! Signature validation and event deserialization for LINE Messaging API
//! webhooks.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use lensbridge_core::{BridgeError, BridgeResult, ImageEvent};
use serde::Deserialize;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// `signature` must be the base64 HMAC-SHA256 of the raw body keyed by the
/// channel secret. Comparison is constant time.
pub fn verify_signature(channel_secret: &str, signature: &str, body: &[u8]) -> BridgeResult<()> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| BridgeError::SignatureInvalid)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| BridgeError::SignatureInvalid)?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| BridgeError::SignatureInvalid)
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

/// What the webhook does with one event.
#[derive(Debug, PartialEq)]
pub enum InboundEvent {
    Image(ImageEvent),
    Text { reply_token: Option<String>, text: String },
    Ignored { kind: String },
}

impl WebhookEvent {
    pub fn classify(self) -> InboundEvent {
        let user_id = self.source.and_then(|s| s.user_id);
        match (self.event_type.as_str(), self.message) {
            ("message", Some(message)) if message.kind == "image" => {
                InboundEvent::Image(ImageEvent {
                    message_id: message.id,
                    reply_token: self.reply_token,
                    user_id,
                })
            }
            ("message", Some(message)) if message.kind == "text" => InboundEvent::Text {
                reply_token: self.reply_token,
                text: message.text.unwrap_or_default(),
            },
            ("message", Some(message)) => InboundEvent::Ignored { kind: format!("message/{}", message.kind) },
            (other, _) => InboundEvent::Ignored { kind: other.to_string() },
        }
    }
}

pub fn parse_webhook(body: &[u8]) -> Result<WebhookPayload, serde_json::Error> {
    serde_json::from_slice(body)
}
