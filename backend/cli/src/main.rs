mod api;
mod check_cmd;
mod wiring;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use lensbridge_channels::{ChannelAdapter, LineAdapter, LineConfig};
use lensbridge_config::{ensure_valid, load_and_prepare, resolve_config_path, BridgeConfig};
use lensbridge_logging::init_logger;
use lensbridge_pipeline::spawn_worker;

#[derive(Parser)]
#[command(name = "lensbridge")]
#[command(about = "LensBridge: LINE image analysis bot (faces, text, captions)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server and image worker
    Serve {
        /// Port to bind the HTTP server to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Config file (JSON or YAML)
        #[arg(short, long, env = "LENSBRIDGE_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the redacted config and its validation report
    CheckConfig {
        /// Config file (JSON or YAML)
        #[arg(short, long, env = "LENSBRIDGE_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let path = resolve_config_path(config.as_deref());
            let mut config = load_and_prepare(&path).await?;
            if let Some(port) = port {
                config.server.port = port;
            }
            init_logger(config.logging.dir.as_deref(), &config.logging.level);
            info!(path = %path.display(), "Configuration loaded");
            ensure_valid(&config)?;

            run_server(config).await?;
        }
        Commands::CheckConfig { config } => {
            let path = resolve_config_path(config.as_deref());
            if !check_cmd::run(&path).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_server(config: BridgeConfig) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind,
        webhook = %config.server.webhook_path,
        "Starting LensBridge"
    );

    let wired = wiring::build(&config).await?;

    // Image worker
    let (image_tx, worker) = spawn_worker(Arc::new(wired.composer), config.pipeline.queue_depth);
    tokio::spawn(async move {
        if let Err(e) = worker.await {
            error!(error = %e, "Image worker task failed");
        }
    });

    // LINE webhook
    let line = LineAdapter::new(
        LineConfig {
            channel_secret: config.line.channel_secret.clone(),
            webhook_path: config.server.webhook_path.clone(),
        },
        wired.messenger,
        image_tx,
    );
    line.start().await?;
    info!("Registered {} channel adapter", line.name());

    let app = api::build_router(line.build_router()).layer(TraceLayer::new_for_http());
    let addr = format!("{}:{}", config.server.bind, config.server.port);

    info!(addr = %addr, "HTTP server listening");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
