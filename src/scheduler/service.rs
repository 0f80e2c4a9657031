use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::notify::Notifier;
use crate::storage::Store;
use crate::tracker::fetcher::Fetcher;
use crate::tracker::service::TrackingService;

/// Drives periodic sweeps over all active items.
pub struct PollScheduler<S, F, N> {
    service: Arc<TrackingService<S, F, N>>,
    period: Duration,
    item_delay: Duration,
}

impl<S: Store, F: Fetcher, N: Notifier> PollScheduler<S, F, N> {
    pub fn new(
        service: Arc<TrackingService<S, F, N>>,
        period: Duration,
        item_delay: Duration,
    ) -> Self {
        Self {
            service,
            period,
            item_delay,
        }
    }

    /// Runs sweeps until the shutdown signal flips. A sweep in progress
    /// stops after the item it is currently on.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(&mut shutdown).await {
                        error!(error = %e, "sweep failed");
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("poll scheduler stopped");
    }

    /// One pass over the active items: strictly sequential, a politeness
    /// delay between fetches, and per-item failures logged without
    /// aborting the rest. Returns how many items were processed.
    pub async fn sweep(&self, shutdown: &mut watch::Receiver<bool>) -> Result<usize> {
        let items = self.service.active_items().await?;
        let total = items.len();
        info!(total, "starting sweep");

        let mut checked = 0usize;
        for item in items {
            let item_id = item.id;
            if let Err(e) = self.service.check_item(item).await {
                warn!(item_id, error = %e, "item check failed");
            }
            checked += 1;
            if checked == total {
                break;
            }
            tokio::select! {
                _ = sleep(self.item_delay) => {}
                _ = shutdown.changed() => {
                    info!(checked, total, "sweep aborted");
                    return Ok(checked);
                }
            }
        }

        info!(checked, "sweep complete");
        Ok(checked)
    }
}
