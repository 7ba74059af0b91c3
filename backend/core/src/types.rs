use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in image pixel space (x, y).
pub type Point = (f32, f32);

/// Axis-aligned face rectangle as reported by the face service.
/// Top-left origin, relative to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }
}

/// A face found by detection, keyed by the service-issued face id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub face_id: String,
    pub region: FaceRegion,
}

/// One identity match for a detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub person_id: String,
    pub confidence: f64,
}

/// Identification result for one face id. Candidates are ranked upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceIdentification {
    pub face_id: String,
    pub candidates: Vec<Candidate>,
}

/// A face ready to be drawn: its box plus the label shown above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedFace {
    pub region: FaceRegion,
    pub label: String,
    pub confidence: Option<f64>,
}

/// One recognized line of text. The polygon is not necessarily axis-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub polygon: [Point; 4],
    pub text: String,
}

/// Lines recognized on one page of a read result, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub lines: Vec<TextLine>,
}

/// A generated image caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

/// Handle to a submitted asynchronous read job (the operation-location URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadJob(pub String);

impl ReadJob {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a read job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl ReadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReadStatus::Succeeded | ReadStatus::Failed)
    }
}

/// Snapshot returned by one status poll. `regions` is only populated once the
/// job has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadProgress {
    pub status: ReadStatus,
    pub regions: Vec<TextRegion>,
}

impl ReadProgress {
    pub fn pending(status: ReadStatus) -> Self {
        Self { status, regions: Vec::new() }
    }
}

/// The three emission stages run for every inbound image, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Face,
    Ocr,
    Description,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Face => write!(f, "face"),
            Stage::Ocr => write!(f, "ocr"),
            Stage::Description => write!(f, "description"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_succeeded_and_failed_are_terminal() {
        assert!(!ReadStatus::NotStarted.is_terminal());
        assert!(!ReadStatus::Running.is_terminal());
        assert!(ReadStatus::Succeeded.is_terminal());
        assert!(ReadStatus::Failed.is_terminal());
    }

    #[test]
    fn read_status_uses_service_spelling() {
        let status: ReadStatus = serde_json::from_str("\"notStarted\"").unwrap();
        assert_eq!(status, ReadStatus::NotStarted);
    }
}
