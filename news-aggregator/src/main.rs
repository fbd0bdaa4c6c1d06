use anyhow::Context;
use clap::Parser;
use news_aggregator::api::{serve, with_static_dir};
use news_aggregator::config::mask_password;
use news_aggregator::{create_router, open_store, Aggregator, AppConfig, AppState, Fetcher, Scheduler};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "news-aggregator", about = "Polls RSS feeds and serves the latest entries as JSON")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single fetch cycle and exit
    #[arg(long)]
    once: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting news aggregator");

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Error loading config {}", cli.config.display()))?;

    let store = open_store(&config.database_url)
        .await
        .with_context(|| format!("Error connecting to database {}", mask_password(&config.database_url)))?;

    let fetcher = Fetcher::new(config.fetch.clone()).context("Error creating HTTP client")?;
    let scheduler = Scheduler::new(
        Aggregator::new(Arc::new(fetcher)),
        store.clone(),
        config.rss.clone(),
        config.cycle_interval(),
    );

    if cli.once {
        let report = scheduler.run_cycle().await;
        store.close().await;
        if report.upsert.is_none() {
            anyhow::bail!("Cycle {} could not save posts", report.cycle_id);
        }
        return Ok(());
    }

    let scheduler = scheduler.spawn();

    let mut router = create_router(AppState::new(store.clone()));
    if let Some(dir) = &config.static_dir {
        if dir.exists() {
            router = with_static_dir(router, dir);
        } else {
            warn!("Static directory {} does not exist, not serving it", dir.display());
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Error binding {}", addr))?;

    let served = serve(listener, router, shutdown_signal()).await;

    scheduler.shutdown().await;
    store.close().await;
    served.context("Error running server")?;

    info!("News aggregator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
