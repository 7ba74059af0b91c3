//! Shared plumbing for Azure Cognitive Services REST calls.

use lensbridge_core::{BridgeError, BridgeResult};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub(crate) const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Endpoint + key pair of one Azure resource.
#[derive(Debug, Clone)]
pub struct AzureCredentials {
    pub endpoint: String,
    pub key: String,
}

impl AzureCredentials {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(SUBSCRIPTION_KEY_HEADER, &self.key)
    }
}

pub(crate) async fn send(service: &str, request: RequestBuilder) -> BridgeResult<Response> {
    let resp = request
        .send()
        .await
        .map_err(|e| BridgeError::upstream(service, e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BridgeError::upstream(service, format!("{status}: {body}")));
    }
    Ok(resp)
}

pub(crate) async fn read_body(service: &str, resp: Response) -> BridgeResult<String> {
    resp.text()
        .await
        .map_err(|e| BridgeError::upstream(service, e.to_string()))
}

pub(crate) async fn read_json<T: DeserializeOwned>(service: &str, resp: Response) -> BridgeResult<T> {
    parse_json(service, &read_body(service, resp).await?)
}

pub(crate) fn parse_json<T: DeserializeOwned>(service: &str, body: &str) -> BridgeResult<T> {
    serde_json::from_str(body)
        .map_err(|e| BridgeError::upstream(service, format!("malformed response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly() {
        let creds = AzureCredentials::new("https://face.example.com/", "k");
        assert_eq!(creds.url("/face/v1.0/detect"), "https://face.example.com/face/v1.0/detect");
        assert_eq!(creds.url("vision/v3.2/describe"), "https://face.example.com/vision/v3.2/describe");
    }

    #[test]
    fn malformed_json_is_upstream_error() {
        let err = parse_json::<Vec<u32>>("azure-face", "{oops").unwrap_err();
        assert!(matches!(err, BridgeError::Upstream { ref service, .. } if service == "azure-face"));
    }
}
