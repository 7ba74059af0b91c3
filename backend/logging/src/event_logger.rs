//! Pipeline Event Logger
//!
//! One structured record per stage outcome, under the `pipeline_events`
//! target, so a message's fate can be reconstructed from the NDJSON log.

use chrono::{DateTime, Utc};
use lensbridge_core::Stage;
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageEmitted { stage: Stage, url: String },
    StageSkipped { stage: Stage },
    StageFailed { stage: Stage, error: String },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one pipeline event. Returns the entry that was logged.
    pub fn log_event(message_id: &str, mut event: PipelineEvent) -> EventLogEntry {
        if let PipelineEvent::StageFailed { error, .. } = &mut event {
            *error = redact_sensitive_data(error);
        }

        let entry = EventLogEntry {
            message_id: message_id.into(),
            timestamp: Utc::now(),
            event,
        };
        let json = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            PipelineEvent::StageFailed { .. } => {
                warn!(target: "pipeline_events", event = %json, "Pipeline stage failed")
            }
            _ => info!(target: "pipeline_events", event = %json, "Pipeline event"),
        }
        entry
    }
}
