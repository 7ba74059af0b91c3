//! Sequential image worker.
//!
//! Webhook handlers only enqueue; this task drains the queue and fully
//! processes one image before taking the next.

use std::sync::Arc;

use lensbridge_core::ImageEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::composer::ResponseComposer;

pub async fn run_worker(composer: Arc<ResponseComposer>, mut rx: mpsc::Receiver<ImageEvent>) {
    info!("Image worker started");

    while let Some(event) = rx.recv().await {
        match composer.process(&event).await {
            Ok(report) if !report.failed.is_empty() => {
                warn!(
                    message_id = %event.message_id,
                    failed = ?report.failed,
                    emitted = report.emitted.len(),
                    "Image processed with failed stages"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(message_id = %event.message_id, error = %e, "Image could not be processed");
            }
        }
    }

    info!("Image queue closed, worker shutting down");
}

/// Create the bounded queue and start the worker on it.
pub fn spawn_worker(
    composer: Arc<ResponseComposer>,
    queue_depth: usize,
) -> (mpsc::Sender<ImageEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    let handle = tokio::spawn(run_worker(composer, rx));
    (tx, handle)
}
