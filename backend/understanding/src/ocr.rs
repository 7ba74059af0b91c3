//! Optical Character Recognition (OCR)
//!
//! Azure Computer Vision Read: submit an image URL, poll the returned
//! operation until it reaches a terminal status, then take the recognized
//! lines with their bounding polygons.

use async_trait::async_trait;
use lensbridge_core::{
    BridgeError, BridgeResult, Point, ReadJob, ReadProgress, ReadStatus, TextLine, TextReader,
    TextRegion,
};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::azure::{parse_json, read_body, send};
use crate::poll::{poll_until, PollOutcome, PollPolicy};
use crate::vision::ComputerVisionClient;

const SERVICE: &str = "azure-read";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReadOperation {
    status: ReadStatus,
    analyze_result: Option<WireAnalyzeResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalyzeResult {
    #[serde(default)]
    read_results: Vec<WireReadResult>,
}

#[derive(Deserialize)]
struct WireReadResult {
    #[serde(default)]
    lines: Vec<WireLine>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLine {
    bounding_box: Vec<f32>,
    text: String,
}

/// `[x1, y1, x2, y2, x3, y3, x4, y4]` → four corner points.
fn polygon_from(bounding_box: &[f32]) -> BridgeResult<[Point; 4]> {
    match bounding_box {
        [x1, y1, x2, y2, x3, y3, x4, y4] => Ok([(*x1, *y1), (*x2, *y2), (*x3, *y3), (*x4, *y4)]),
        other => Err(BridgeError::upstream(
            SERVICE,
            format!("bounding box has {} values, expected 8", other.len()),
        )),
    }
}

fn progress_from(op: WireReadOperation) -> BridgeResult<ReadProgress> {
    if op.status != ReadStatus::Succeeded {
        return Ok(ReadProgress::pending(op.status));
    }
    let mut regions = Vec::new();
    for page in op.analyze_result.map(|r| r.read_results).unwrap_or_default() {
        let mut lines = Vec::with_capacity(page.lines.len());
        for line in page.lines {
            lines.push(TextLine { polygon: polygon_from(&line.bounding_box)?, text: line.text });
        }
        regions.push(TextRegion { lines });
    }
    Ok(ReadProgress { status: ReadStatus::Succeeded, regions })
}

fn parse_progress(body: &str) -> BridgeResult<ReadProgress> {
    progress_from(parse_json(SERVICE, body)?)
}

#[async_trait]
impl TextReader for ComputerVisionClient {
    async fn submit_read(&self, image_url: &str) -> BridgeResult<ReadJob> {
        let request = self
            .credentials()
            .authorize(self.http().post(self.credentials().url("vision/v3.2/read/analyze")))
            .json(&serde_json::json!({ "url": image_url }));
        let resp = send(SERVICE, request).await?;
        let location = resp
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BridgeError::upstream(SERVICE, "missing Operation-Location header"))?;
        debug!(operation = %location, "[OCR] Read job submitted");
        Ok(ReadJob(location.to_string()))
    }

    async fn poll_status(&self, job: &ReadJob) -> BridgeResult<ReadProgress> {
        let request = self.credentials().authorize(self.http().get(job.as_str()));
        let resp = send(SERVICE, request).await?;
        parse_progress(&read_body(SERVICE, resp).await?)
    }
}

/// Submit a read job and wait for it. Submission and polling share the
/// `policy.timeout` deadline. A job that ends in `failed` is an upstream
/// error.
pub async fn read_text(
    reader: &dyn TextReader,
    image_url: &str,
    policy: &PollPolicy,
) -> BridgeResult<Vec<TextRegion>> {
    let started = Instant::now();
    let job = match tokio::time::timeout(policy.timeout, reader.submit_read(image_url)).await {
        Ok(submitted) => submitted?,
        Err(_) => {
            warn!("[OCR] Read job submission did not answer in time");
            return Err(BridgeError::PollTimeout { attempts: 0, elapsed: started.elapsed() });
        }
    };
    let remaining = PollPolicy {
        timeout: policy.timeout.saturating_sub(started.elapsed()),
        ..policy.clone()
    };
    let progress = poll_until(&remaining, |attempt| {
        let job = &job;
        async move {
            let progress = reader.poll_status(job).await?;
            debug!(attempt, status = ?progress.status, "[OCR] Polled read job");
            Ok(if progress.status.is_terminal() {
                PollOutcome::Ready(progress)
            } else {
                PollOutcome::Pending
            })
        }
    })
    .await?;

    match progress.status {
        ReadStatus::Succeeded => {
            let lines: usize = progress.regions.iter().map(|r| r.lines.len()).sum();
            info!(lines, "[OCR] Read job succeeded");
            Ok(progress.regions)
        }
        status => {
            warn!(?status, job = %job.as_str(), "[OCR] Read job did not succeed");
            Err(BridgeError::upstream(SERVICE, format!("read job ended with status {status:?}")))
        }
    }
}
