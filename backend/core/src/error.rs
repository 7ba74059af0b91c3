use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the LensBridge runtime.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("webhook signature is missing or invalid")]
    SignatureInvalid,

    #[error("upstream service error ({service}): {message}")]
    Upstream { service: String, message: String },

    #[error("read job did not finish after {attempts} polls ({elapsed:?})")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("staging error: {0}")]
    Staging(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
