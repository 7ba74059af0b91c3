//! Imgur image hosting.
//!
//! Uploads a staged file and returns the public link the chat platform and the
//! analysis services fetch the image from.

use std::path::Path;

use async_trait::async_trait;
use lensbridge_core::{BridgeError, BridgeResult, ImageHost};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::mime_detect::detect_mime_type;

const IMGUR_API: &str = "https://api.imgur.com";

#[derive(Debug, Clone)]
pub struct ImgurCredentials {
    pub client_id: String,
    /// OAuth access token. Uploads go to the account when set, anonymous
    /// (`Client-ID`) otherwise.
    pub access_token: Option<String>,
}

pub struct ImgurHost {
    credentials: ImgurCredentials,
    api_base: String,
    http: Client,
}

impl ImgurHost {
    /// `http` should carry a request timeout; the upload has no other bound.
    pub fn new(credentials: ImgurCredentials, http: Client) -> Self {
        Self {
            credentials,
            api_base: IMGUR_API.to_string(),
            http,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn authorization(&self) -> String {
        match &self.credentials.access_token {
            Some(token) if !token.is_empty() => format!("Bearer {token}"),
            _ => format!("Client-ID {}", self.credentials.client_id),
        }
    }
}

#[derive(Deserialize)]
struct ImgurEnvelope {
    success: bool,
    data: ImgurImage,
}

#[derive(Deserialize)]
struct ImgurImage {
    link: Option<String>,
    error: Option<serde_json::Value>,
}

fn link_from_body(body: &str) -> BridgeResult<String> {
    let envelope: ImgurEnvelope = serde_json::from_str(body)
        .map_err(|e| BridgeError::upstream("imgur", format!("malformed response: {e}")))?;
    match (envelope.success, envelope.data.link) {
        (true, Some(link)) => Ok(link),
        _ => Err(BridgeError::upstream(
            "imgur",
            format!("upload rejected: {}", envelope.data.error.unwrap_or_default()),
        )),
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    async fn upload(&self, path: &Path) -> BridgeResult<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BridgeError::Staging(format!("read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(detect_mime_type(path))
            .map_err(|e| BridgeError::upstream("imgur", e.to_string()))?;
        let form = Form::new()
            .part("image", part)
            .text("type", "file")
            .text("title", file_name.clone());

        let resp = self
            .http
            .post(format!("{}/3/image", self.api_base))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await
            .map_err(|e| BridgeError::upstream("imgur", e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BridgeError::upstream("imgur", e.to_string()))?;
        if !status.is_success() {
            return Err(BridgeError::upstream("imgur", format!("{status}: {body}")));
        }
        let link = link_from_body(&body)?;
        info!(file = %file_name, url = %link, "Uploaded image");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn host(token: Option<&str>) -> ImgurHost {
        ImgurHost::new(
            ImgurCredentials {
                client_id: "cid".into(),
                access_token: token.map(String::from),
            },
            Client::new(),
        )
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn extracts_link_from_success() {
        let body = r#"{"data":{"id":"abc","link":"https://i.imgur.com/abc.jpg"},"success":true,"status":200}"#;
        assert_eq!(link_from_body(body).unwrap(), "https://i.imgur.com/abc.jpg");
    }

    #[test]
    fn rejected_upload_is_upstream_error() {
        let body = r#"{"data":{"error":"Bad image"},"success":false,"status":400}"#;
        let err = link_from_body(body).unwrap_err();
        assert!(matches!(err, BridgeError::Upstream { .. }));
        assert!(err.to_string().contains("Bad image"));
    }

    #[test]
    fn prefers_bearer_token_over_client_id() {
        assert_eq!(host(Some("tok")).authorization(), "Bearer tok");
        assert_eq!(host(None).authorization(), "Client-ID cid");
        assert_eq!(host(Some("")).authorization(), "Client-ID cid");
    }

    #[tokio::test]
    async fn unanswered_upload_times_out_as_upstream_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("100.png");
        std::fs::write(&file, b"\x89PNG\r\n\x1a\n\0\0\0\0").unwrap();

        let http = Client::builder().timeout(Duration::from_millis(200)).build().unwrap();
        let host = ImgurHost::new(
            ImgurCredentials { client_id: "cid".into(), access_token: None },
            http,
        )
        .with_api_base(silent_server().await);

        let outcome = tokio::time::timeout(Duration::from_secs(5), host.upload(&file))
            .await
            .expect("request timeout should fire first");
        match outcome {
            Err(BridgeError::Upstream { service, .. }) => assert_eq!(service, "imgur"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn api_base_drops_trailing_slash() {
        let h = host(None).with_api_base("http://127.0.0.1:9/");
        assert_eq!(h.api_base, "http://127.0.0.1:9");
    }
}
