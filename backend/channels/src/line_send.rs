//! LINE Senders
//!
//! Turns pipeline output into LINE image and flex messages, delivers them via
//! the Reply or Push API, and downloads inbound message content.

use std::path::Path;

use async_trait::async_trait;
use lensbridge_core::{
    BridgeError, BridgeResult, ChatMessenger, ContentSource, Delivery, FlexCard, OutboundMessage,
};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

pub const LINE_API_BASE: &str = "https://api.line.me";
pub const LINE_DATA_BASE: &str = "https://api-data.line.me";
pub const FLEX_ALT_TEXT: &str = "Report";

const SERVICE: &str = "line";

pub struct LineMessenger {
    access_token: String,
    api_base: String,
    data_base: String,
    flex_template: Option<Value>,
    http: Client,
}

impl LineMessenger {
    pub fn new(access_token: impl Into<String>, http: Client) -> Self {
        Self {
            access_token: access_token.into(),
            api_base: LINE_API_BASE.to_string(),
            data_base: LINE_DATA_BASE.to_string(),
            flex_template: None,
            http,
        }
    }

    pub fn with_bases(mut self, api_base: impl Into<String>, data_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.data_base = data_base.into();
        self
    }

    /// Use a bubble layout loaded with [`load_flex_template`] for every card.
    pub fn with_flex_template(mut self, template: Value) -> Self {
        self.flex_template = Some(template);
        self
    }

    /// Plain text reply; used for the upload prompt.
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> BridgeResult<()> {
        let delivery = Delivery::Reply { token: reply_token.to_string() };
        self.post_messages(&delivery, vec![json!({ "type": "text", "text": text })]).await
    }

    async fn post_messages(&self, delivery: &Delivery, messages: Vec<Value>) -> BridgeResult<()> {
        let (endpoint, body) = match delivery {
            Delivery::Reply { token } => {
                ("reply", json!({ "replyToken": token, "messages": messages }))
            }
            Delivery::Push { to } => ("push", json!({ "to": to, "messages": messages })),
        };
        let resp = self
            .http
            .post(format!("{}/v2/bot/message/{endpoint}", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::upstream(SERVICE, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(BridgeError::upstream(SERVICE, format!("{endpoint} {status}: {detail}")));
        }
        debug!(endpoint, "[LINE] Message delivered");
        Ok(())
    }
}

#[async_trait]
impl ChatMessenger for LineMessenger {
    async fn send(&self, delivery: &Delivery, message: &OutboundMessage) -> BridgeResult<()> {
        let payload = message_json(message, self.flex_template.as_ref())?;
        self.post_messages(delivery, vec![payload]).await
    }
}

#[async_trait]
impl ContentSource for LineMessenger {
    async fn fetch_content(&self, message_id: &str) -> BridgeResult<Vec<u8>> {
        let resp = self
            .http
            .get(format!("{}/v2/bot/message/{message_id}/content", self.data_base))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BridgeError::upstream(SERVICE, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::upstream(SERVICE, format!("content {message_id}: {status}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BridgeError::upstream(SERVICE, e.to_string()))?;
        info!(message_id, bytes = bytes.len(), "[LINE] Downloaded message content");
        Ok(bytes.to_vec())
    }
}

/// Read a bubble layout from disk. It must contain `hero.url`,
/// `hero.action.uri` and `body.contents[0].text`.
pub fn load_flex_template(path: &Path) -> BridgeResult<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BridgeError::Config(format!("read {}: {e}", path.display())))?;
    let template: Value = serde_json::from_str(&raw)
        .map_err(|e| BridgeError::Config(format!("parse {}: {e}", path.display())))?;
    // Fail at startup, not on the first card.
    flex_bubble(&FlexCard::with_hero("", ""), Some(&template))?;
    Ok(template)
}

pub fn message_json(message: &OutboundMessage, template: Option<&Value>) -> BridgeResult<Value> {
    Ok(match message {
        OutboundMessage::Image { url } => json!({
            "type": "image",
            "originalContentUrl": url,
            "previewImageUrl": url,
        }),
        OutboundMessage::Flex(card) => json!({
            "type": "flex",
            "altText": FLEX_ALT_TEXT,
            "contents": flex_bubble(card, template)?,
        }),
    })
}

/// Hero image linking to itself above a wrapped text body.
pub fn flex_bubble(card: &FlexCard, template: Option<&Value>) -> BridgeResult<Value> {
    let Some(template) = template else {
        return Ok(json!({
            "type": "bubble",
            "hero": {
                "type": "image",
                "url": card.hero_image_url,
                "size": "full",
                "aspectRatio": "20:13",
                "aspectMode": "cover",
                "action": { "type": "uri", "uri": card.hero_link_url },
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [{ "type": "text", "text": card.body_text, "wrap": true }],
            },
        }));
    };

    let mut bubble = template.clone();
    for (pointer, value) in [
        ("/hero/url", &card.hero_image_url),
        ("/hero/action/uri", &card.hero_link_url),
        ("/body/contents/0/text", &card.body_text),
    ] {
        let slot = bubble
            .pointer_mut(pointer)
            .ok_or_else(|| BridgeError::Config(format!("flex template has no {pointer}")))?;
        *slot = Value::String(value.clone());
    }
    Ok(bubble)
}
