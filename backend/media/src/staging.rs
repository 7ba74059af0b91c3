//! Per-message working files.
//!
//! Every file lives under the staging root and is named by the inbound message
//! id, so concurrent messages never collide. A [`StagingScope`] removes every
//! file it created when dropped, whether the pipeline succeeded or not.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use lensbridge_core::{BridgeError, BridgeResult};
use tracing::{debug, warn};

use crate::mime_detect::image_extension;

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging root if it is missing.
    pub async fn ensure(&self) -> BridgeResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BridgeError::Staging(format!("create {}: {e}", self.root.display())))
    }

    /// Open a scope for one message. Ids are used as file stems, so only
    /// `[A-Za-z0-9_-]` is accepted.
    pub fn scope(&self, message_id: &str) -> BridgeResult<StagingScope> {
        let valid = !message_id.is_empty()
            && message_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BridgeError::Staging(format!(
                "message id {message_id:?} is not a safe file stem"
            )));
        }
        Ok(StagingScope {
            root: self.root.clone(),
            stem: message_id.to_string(),
            files: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct StagingScope {
    root: PathBuf,
    stem: String,
    files: Vec<PathBuf>,
}

impl StagingScope {
    /// Store the original download as `<id>.<ext>`, extension sniffed from the
    /// content.
    pub async fn write_source(&mut self, bytes: &[u8]) -> BridgeResult<PathBuf> {
        let path = self.root.join(format!("{}.{}", self.stem, image_extension(bytes)));
        self.files.push(path.clone());
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BridgeError::Staging(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Staged source image");
        Ok(path)
    }

    /// Encode an annotated variant as `<id>_<suffix>.jpg`.
    pub fn write_variant(&mut self, suffix: &str, image: &RgbImage) -> BridgeResult<PathBuf> {
        let path = self.root.join(format!("{}_{}.jpg", self.stem, suffix));
        self.files.push(path.clone());
        image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|e| BridgeError::Staging(format!("encode {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Staged annotated image");
        Ok(path)
    }
}

impl Drop for StagingScope {
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed staged file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged file"),
            }
        }
    }
}
