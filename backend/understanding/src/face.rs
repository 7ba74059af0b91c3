/// Azure Face client: detection, identification against a person group, and
/// person name lookup.
use async_trait::async_trait;
use lensbridge_core::{
    BridgeResult, Candidate, DetectedFace, FaceAnalyzer, FaceIdentification, FaceRegion,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::azure::{parse_json, read_body, read_json, send, AzureCredentials};

const SERVICE: &str = "azure-face";
pub const DETECTION_MODEL: &str = "detection_01";
/// Identify accepts at most this many face ids per call.
pub const IDENTIFY_BATCH: usize = 10;

pub struct AzureFaceClient {
    credentials: AzureCredentials,
    http: Client,
}

impl AzureFaceClient {
    pub fn new(credentials: AzureCredentials, http: Client) -> Self {
        Self { credentials, http }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFace {
    face_id: String,
    face_rectangle: WireRectangle,
}

#[derive(Deserialize)]
struct WireRectangle {
    top: i32,
    left: i32,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdentification {
    face_id: String,
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    person_id: String,
    confidence: f64,
}

#[derive(Deserialize)]
struct WirePerson {
    name: String,
}

impl From<WireFace> for DetectedFace {
    fn from(w: WireFace) -> Self {
        let r = w.face_rectangle;
        DetectedFace {
            face_id: w.face_id,
            region: FaceRegion::new(r.left, r.top, r.width, r.height),
        }
    }
}

impl From<WireIdentification> for FaceIdentification {
    fn from(w: WireIdentification) -> Self {
        FaceIdentification {
            face_id: w.face_id,
            candidates: w
                .candidates
                .into_iter()
                .map(|c| Candidate { person_id: c.person_id, confidence: c.confidence })
                .collect(),
        }
    }
}

fn parse_detect(body: &str) -> BridgeResult<Vec<DetectedFace>> {
    let faces: Vec<WireFace> = parse_json(SERVICE, body)?;
    Ok(faces.into_iter().map(Into::into).collect())
}

#[async_trait]
impl FaceAnalyzer for AzureFaceClient {
    async fn detect(&self, image_url: &str) -> BridgeResult<Vec<DetectedFace>> {
        let url = self.credentials.url(&format!(
            "face/v1.0/detect?returnFaceId=true&returnFaceLandmarks=false&detectionModel={DETECTION_MODEL}"
        ));
        let request = self
            .credentials
            .authorize(self.http.post(url))
            .json(&serde_json::json!({ "url": image_url }));
        let resp = send(SERVICE, request).await?;
        let faces = parse_detect(&read_body(SERVICE, resp).await?)?;
        info!(faces = faces.len(), "[Face] Detection finished");
        Ok(faces)
    }

    async fn identify(
        &self,
        face_ids: &[String],
        group_id: &str,
    ) -> BridgeResult<Vec<FaceIdentification>> {
        let mut results = Vec::with_capacity(face_ids.len());
        for batch in face_ids.chunks(IDENTIFY_BATCH) {
            let request = self
                .credentials
                .authorize(self.http.post(self.credentials.url("face/v1.0/identify")))
                .json(&serde_json::json!({ "faceIds": batch, "personGroupId": group_id }));
            let resp = send(SERVICE, request).await?;
            let wire: Vec<WireIdentification> = read_json(SERVICE, resp).await?;
            results.extend(wire.into_iter().map(FaceIdentification::from));
        }
        debug!(faces = face_ids.len(), group = %group_id, "[Face] Identification finished");
        Ok(results)
    }

    async fn person_name(&self, group_id: &str, person_id: &str) -> BridgeResult<String> {
        let url = self
            .credentials
            .url(&format!("face/v1.0/persongroups/{group_id}/persons/{person_id}"));
        let resp = send(SERVICE, self.credentials.authorize(self.http.get(url))).await?;
        let person: WirePerson = read_json(SERVICE, resp).await?;
        Ok(person.name)
    }
}
