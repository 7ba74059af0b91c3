/// Vision understanding: caption images with Azure Computer Vision.
///
/// The same client also implements `TextReader` (see `ocr.rs`), since both
/// operations live on one Computer Vision resource.
use async_trait::async_trait;
use lensbridge_core::{BridgeResult, Caption, ImageDescriber};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::azure::{parse_json, read_body, send, AzureCredentials};

const SERVICE: &str = "azure-describe";

pub struct ComputerVisionClient {
    credentials: AzureCredentials,
    http: Client,
}

impl ComputerVisionClient {
    pub fn new(credentials: AzureCredentials, http: Client) -> Self {
        Self { credentials, http }
    }

    pub(crate) fn credentials(&self) -> &AzureCredentials {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
}

#[derive(Deserialize)]
struct WireDescribe {
    description: WireDescription,
}

#[derive(Deserialize)]
struct WireDescription {
    #[serde(default)]
    captions: Vec<Caption>,
}

fn parse_captions(body: &str) -> BridgeResult<Vec<Caption>> {
    let wire: WireDescribe = parse_json(SERVICE, body)?;
    Ok(wire.description.captions)
}

#[async_trait]
impl ImageDescriber for ComputerVisionClient {
    async fn describe(&self, image_url: &str) -> BridgeResult<Vec<Caption>> {
        let request = self
            .credentials
            .authorize(self.http.post(self.credentials.url("vision/v3.2/describe")))
            .json(&serde_json::json!({ "url": image_url }));
        let resp = send(SERVICE, request).await?;
        let captions = parse_captions(&read_body(SERVICE, resp).await?)?;
        info!(captions = captions.len(), "[Vision] Description finished");
        Ok(captions)
    }
}
