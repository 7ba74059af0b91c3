use async_trait::async_trait;

pub mod line;
pub mod line_receive;
pub mod line_send;

pub use line::{LineAdapter, LineConfig, UPLOAD_PROMPT};
pub use line_receive::{verify_signature, InboundEvent, SIGNATURE_HEADER};
pub use line_send::{load_flex_template, LineMessenger};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Axum sub-router for inbound webhook endpoints.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Startup hook, run once before the server accepts requests.
    async fn start(&self) -> anyhow::Result<()>;
}
