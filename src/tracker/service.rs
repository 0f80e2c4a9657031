use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::storage::Store;
use crate::tracker::extractor;
use crate::tracker::fetcher::Fetcher;
use crate::tracker::models::TrackedItem;
use crate::tracker::state;

/// Runs the fetch → extract → apply → persist → notify pipeline for one
/// item at a time. Safe to share: on-demand checks may run concurrently
/// with a sweep, including against the same item (last write wins).
pub struct TrackingService<S, F, N> {
    store: S,
    fetcher: F,
    notifier: N,
}

impl<S: Store, F: Fetcher, N: Notifier> TrackingService<S, F, N> {
    pub fn new(store: S, fetcher: F, notifier: N) -> Self {
        Self {
            store,
            fetcher,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn active_items(&self) -> Result<Vec<TrackedItem>> {
        self.store.active_items().await
    }

    /// On-demand check of a single item.
    pub async fn check_by_id(&self, id: i64) -> Result<Option<f64>> {
        let item = self
            .store
            .item(id)
            .await?
            .with_context(|| format!("item {id} not found"))?;
        self.check_item(item).await
    }

    /// Checks one item and returns the extracted price. A fetch or
    /// extraction failure yields `Ok(None)`: the attempt is stamped on the
    /// item but its price state stays untouched.
    pub async fn check_item(&self, item: TrackedItem) -> Result<Option<f64>> {
        let now = Utc::now();
        info!(item_id = item.id, name = %item.name, url = %item.url, "checking price");

        let html = match self.fetcher.fetch(&item.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(item_id = item.id, error = %e, "fetch failed");
                self.store.touch_last_checked(item.id, now).await?;
                return Ok(None);
            }
        };

        let Some(price) = extractor::extract_price(&html, item.selector.as_deref()) else {
            warn!(item_id = item.id, "no price found in document");
            self.store.touch_last_checked(item.id, now).await?;
            return Ok(None);
        };

        let old_price = item.current_price;
        let outcome = state::apply(item, price, now);

        self.store.update_item(&outcome.item).await?;
        self.store.append_record(&outcome.record).await?;

        info!(
            item_id = outcome.item.id,
            price,
            old_price = old_price.unwrap_or_default(),
            target = outcome.item.target_price,
            "price updated"
        );

        // Dispatch only after the update is durable; a failed send never
        // rolls the price or history back.
        for notification in &outcome.notifications {
            if let Err(e) = self.notifier.send(&outcome.item, notification).await {
                warn!(item_id = outcome.item.id, error = %e, "notification dispatch failed");
            }
        }

        Ok(Some(price))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::tracker::models::{Notification, TargetLatch};
    use crate::tracker::testing::{item, price_page, MemStore, RecordingNotifier, ScriptedFetcher};

    fn service(
        store: MemStore,
        fetcher: ScriptedFetcher,
    ) -> TrackingService<MemStore, ScriptedFetcher, RecordingNotifier> {
        TrackingService::new(store, fetcher, RecordingNotifier::default())
    }

    #[tokio::test]
    async fn fetch_failure_only_stamps_the_attempt() {
        let mut it = item(1, 500.0);
        it.current_price = Some(600.0);
        let store = MemStore::with_items(vec![it]);
        let fetcher = ScriptedFetcher::new(vec![Err(anyhow!("connect timeout"))]);
        let svc = service(store, fetcher);

        let price = svc.check_by_id(1).await.unwrap();
        assert_eq!(price, None);

        let after = svc.store().item_snapshot(1);
        assert_eq!(after.current_price, Some(600.0));
        assert!(after.last_checked_at.is_some());
        assert!(svc.store().records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn extraction_failure_only_stamps_the_attempt() {
        let store = MemStore::with_items(vec![item(1, 500.0)]);
        let fetcher = ScriptedFetcher::new(vec![Ok(
            "<html><body><p>gone, maybe forever</p></body></html>".to_string()
        )]);
        let svc = service(store, fetcher);

        let price = svc.check_by_id(1).await.unwrap();
        assert_eq!(price, None);

        let after = svc.store().item_snapshot(1);
        assert_eq!(after.current_price, None);
        assert!(after.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn successful_check_persists_item_and_history() {
        let store = MemStore::with_items(vec![item(1, 500.0)]);
        let fetcher = ScriptedFetcher::new(vec![Ok(price_page("₹600"))]);
        let svc = service(store, fetcher);

        let price = svc.check_by_id(1).await.unwrap();
        assert_eq!(price, Some(600.0));

        let after = svc.store().item_snapshot(1);
        assert_eq!(after.current_price, Some(600.0));
        assert_eq!(after.target_latch, TargetLatch::Armed);

        let records = svc.store().records_for_item(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, 600.0);
    }

    #[tokio::test]
    async fn notifications_fire_after_persistence() {
        let store = MemStore::with_items(vec![item(1, 500.0)]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(price_page("₹600")),
            Ok(price_page("₹450")),
            Ok(price_page("₹600")),
            Ok(price_page("₹400")),
        ]);
        let svc = service(store, fetcher);

        for _ in 0..4 {
            svc.check_by_id(1).await.unwrap();
        }

        let sent = svc.notifier_log();
        assert_eq!(
            sent,
            vec![
                (1, Notification::TargetReached),
                (
                    1,
                    Notification::PriceDrop {
                        old_price: 600.0,
                        new_price: 450.0
                    }
                ),
                (1, Notification::TargetReached),
                (
                    1,
                    Notification::PriceDrop {
                        old_price: 600.0,
                        new_price: 400.0
                    }
                ),
            ]
        );

        let after = svc.store().item_snapshot(1);
        assert_eq!(after.current_price, Some(400.0));
        assert_eq!(after.target_latch, TargetLatch::Notified);
    }

    #[tokio::test]
    async fn history_grows_by_one_per_successful_check() {
        let store = MemStore::with_items(vec![item(1, 10.0)]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(price_page("₹100")),
            Err(anyhow!("503")),
            Ok(price_page("₹90")),
            Ok(price_page("₹95")),
        ]);
        let svc = service(store, fetcher);

        for _ in 0..4 {
            svc.check_by_id(1).await.unwrap();
        }

        let prices: Vec<f64> = svc
            .store()
            .records_for_item(1)
            .await
            .unwrap()
            .iter()
            .map(|r| r.price)
            .collect();
        assert_eq!(prices, vec![100.0, 90.0, 95.0]);
    }

    #[tokio::test]
    async fn custom_selector_flows_through_the_pipeline() {
        let mut it = item(1, 500.0);
        it.selector = Some("#our-price".to_string());
        let store = MemStore::with_items(vec![it]);
        let html = r#"<html><body>
            <span class="price">₹999</span>
            <span id="our-price">₹350</span>
        </body></html>"#;
        let fetcher = ScriptedFetcher::new(vec![Ok(html.to_string())]);
        let svc = service(store, fetcher);

        assert_eq!(svc.check_by_id(1).await.unwrap(), Some(350.0));
    }

    #[tokio::test]
    async fn unknown_item_is_an_error() {
        let svc = service(MemStore::default(), ScriptedFetcher::default());
        assert!(svc.check_by_id(42).await.is_err());
    }

    impl TrackingService<MemStore, ScriptedFetcher, RecordingNotifier> {
        fn notifier_log(&self) -> Vec<(i64, Notification)> {
            self.notifier.sent.lock().unwrap().clone()
        }
    }
}
