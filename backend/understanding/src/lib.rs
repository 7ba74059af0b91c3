//! Remote analysis clients (Azure Face, Azure Computer Vision), bounded job
//! polling, and aggregation of their results.

mod azure;
pub mod aggregate;
pub mod face;
pub mod ocr;
pub mod poll;
pub mod vision;

pub use aggregate::{
    collect_ocr_lines, format_descriptions, identified_face, resolve_face_label, OcrText,
    UNKNOWN_LABEL,
};
pub use azure::AzureCredentials;
pub use face::AzureFaceClient;
pub use ocr::read_text;
pub use poll::{poll_until, PollOutcome, PollPolicy};
pub use vision::ComputerVisionClient;
