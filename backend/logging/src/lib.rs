//! Structured logging for the bridge.
//!
//! Console plus rolling NDJSON file output, credential redaction, and the
//! per-event pipeline audit trail.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, PipelineEvent};
pub use logger::{init_logger, LOG_FILE_NAME};
pub use redact::redact_sensitive_data;
