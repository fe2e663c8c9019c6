//! Snapshot service entry point.
//!
//! Run with: cargo run --bin snapcrawl-server -- --config snapcrawl.toml

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use snapcrawl::config::{load_config, SnapcrawlConfig, StoreBackend};
use snapcrawl::orchestrator::SnapshotService;
use snapcrawl::store::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore};
use snapcrawl::{http, logging};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "snapcrawl-server", about = "Serve pre-rendered HTML snapshots")]
struct Args {
    /// Configuration file (defaults to $SNAPCRAWL_CONFIG, then ./snapcrawl.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Listen address, overriding the configuration
    #[arg(long)]
    bind: Option<String>,
    /// Default log filter, overriding the configuration
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.server.log_level = level;
    }
    config.validate()?;
    logging::init(&config.server.log_level);

    match config.store.backend {
        StoreBackend::Memory => run(InMemorySnapshotStore::new(), &config).await?,
        StoreBackend::Filesystem => {
            run(FileSnapshotStore::new(&config.store.root), &config).await?
        }
    }
    Ok(())
}

async fn run<S>(store: S, config: &SnapcrawlConfig) -> Result<(), std::io::Error>
where
    S: SnapshotStore + 'static,
{
    let credentials = config.static_credentials();
    if credentials.is_empty() {
        warn!("no credentials configured; every snapshot request will be rejected");
    }
    let renderer = config.process_renderer();
    info!(
        program = %renderer.program().display(),
        timeout_ms = renderer.timeout().as_millis() as u64,
        "renderer configured"
    );

    let service = Arc::new(SnapshotService::new(store, renderer, credentials));
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "snapshot service listening");

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("snapshot service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
