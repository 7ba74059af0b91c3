//! Structured Logger
//!
//! Console output for operators, and when a directory is given, a daily
//! rolling NDJSON file next to it. `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "lensbridge.log";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init_logger(log_dir: Option<&Path>, level: &str) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    // `lensbridge.log.YYYY-MM-DD`
    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
