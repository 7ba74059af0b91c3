use std::path::Path;

use async_trait::async_trait;

use crate::error::{BridgeError, BridgeResult};
use crate::message::{Delivery, OutboundMessage};
use crate::types::{
    Caption, DetectedFace, FaceIdentification, ReadJob, ReadProgress, ReadStatus, TextRegion,
};

/// Downloads the binary content of an inbound chat message.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self, message_id: &str) -> BridgeResult<Vec<u8>>;
}

/// Sends pipeline output back to the chat platform.
#[async_trait]
pub trait ChatMessenger: Send + Sync {
    async fn send(&self, delivery: &Delivery, message: &OutboundMessage) -> BridgeResult<()>;
}

/// Publishes a local image and returns its public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, path: &Path) -> BridgeResult<String>;
}

/// Remote face detection and identification.
#[async_trait]
pub trait FaceAnalyzer: Send + Sync {
    async fn detect(&self, image_url: &str) -> BridgeResult<Vec<DetectedFace>>;

    async fn identify(
        &self,
        face_ids: &[String],
        group_id: &str,
    ) -> BridgeResult<Vec<FaceIdentification>>;

    async fn person_name(&self, group_id: &str, person_id: &str) -> BridgeResult<String>;
}

/// Asynchronous text recognition (submit, then poll until terminal).
#[async_trait]
pub trait TextReader: Send + Sync {
    async fn submit_read(&self, image_url: &str) -> BridgeResult<ReadJob>;

    async fn poll_status(&self, job: &ReadJob) -> BridgeResult<ReadProgress>;

    /// Fetch the regions of a finished job.
    async fn get_result(&self, job: &ReadJob) -> BridgeResult<Vec<TextRegion>> {
        let progress = self.poll_status(job).await?;
        match progress.status {
            ReadStatus::Succeeded => Ok(progress.regions),
            other => Err(BridgeError::upstream(
                "read",
                format!("job {} is not finished (status {:?})", job.as_str(), other),
            )),
        }
    }
}

/// Caption generation for an image.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(&self, image_url: &str) -> BridgeResult<Vec<Caption>>;
}
