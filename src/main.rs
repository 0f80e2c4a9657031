mod config;
mod notify;
mod scheduler;
mod storage;
mod tracker;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::notify::LogNotifier;
use crate::scheduler::service::PollScheduler;
use crate::storage::postgres::PgStorage;
use crate::tracker::fetcher::HttpFetcher;
use crate::tracker::service::TrackingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    let storage = PgStorage::new(&cfg.database_url).await?;
    storage.migrate().await?;
    info!("database ready");

    let fetcher = HttpFetcher::new(cfg.fetch_timeout)?;
    let service = Arc::new(TrackingService::new(storage, fetcher, LogNotifier));

    let active = service.active_items().await?.len();
    info!(
        active,
        interval_secs = cfg.check_interval.as_secs(),
        "starting poll scheduler"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller = PollScheduler::new(service, cfg.check_interval, cfg.item_delay);
    let handle = tokio::spawn(poller.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        error!(error = %e, "scheduler task failed");
    }

    Ok(())
}
