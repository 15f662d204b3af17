//! Media-request portal gateway.
//!
//! A self-hosted portal backend fronting flat JSON stores: sliding-window
//! rate limiting for credential attempts, multi-scheme session
//! resolution, and reverse-proxy forwarding to internal daemons and
//! third-party media indexers.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use portal_gateway::config::load_config;
use portal_gateway::http::HttpServer;
use portal_gateway::lifecycle::Shutdown;
use portal_gateway::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "portal-gateway")]
#[command(about = "Access-control and request gateway for the media-request portal")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        admin_daemon = %config.admin_daemon.base_url,
        data_dir = %config.storage.data_dir,
        movie_indexer = config.indexers.movie.is_some(),
        series_indexer = config.indexers.series.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
