use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::tracker::models::{Notification, TrackedItem};

/// Delivery seam for notification commands. Channels (mail, push, desktop)
/// live behind this trait; the core persists first and treats delivery as
/// best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, item: &TrackedItem, notification: &Notification) -> Result<()>;
}

/// Emits notifications as structured log events.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, item: &TrackedItem, notification: &Notification) -> Result<()> {
        let to = item.notify_to.as_deref().unwrap_or("-");
        match *notification {
            Notification::PriceDrop {
                old_price,
                new_price,
            } => {
                let saved = old_price - new_price;
                info!(
                    item_id = item.id,
                    name = %item.name,
                    to,
                    old_price,
                    new_price,
                    saved,
                    saved_pct = saved / old_price * 100.0,
                    url = %item.url,
                    "price drop"
                );
            }
            Notification::TargetReached => {
                info!(
                    item_id = item.id,
                    name = %item.name,
                    to,
                    price = item.current_price.unwrap_or_default(),
                    target = item.target_price,
                    url = %item.url,
                    "price below target"
                );
            }
        }
        Ok(())
    }
}
