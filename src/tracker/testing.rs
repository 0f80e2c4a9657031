//! In-memory doubles shared by the pipeline and scheduler tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::notify::Notifier;
use crate::storage::Store;
use crate::tracker::fetcher::Fetcher;
use crate::tracker::models::{
    NewTrackedItem, Notification, PriceRecord, TargetLatch, TrackedItem,
};

#[derive(Default)]
pub struct MemStore {
    pub items: Mutex<Vec<TrackedItem>>,
    pub records: Mutex<Vec<PriceRecord>>,
}

impl MemStore {
    pub fn with_items(items: Vec<TrackedItem>) -> Self {
        Self {
            items: Mutex::new(items),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn item_snapshot(&self, id: i64) -> TrackedItem {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn item(&self, id: i64) -> Result<Option<TrackedItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn active_items(&self) -> Result<Vec<TrackedItem>> {
        let mut items: Vec<TrackedItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.active)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn insert_item(&self, new: &NewTrackedItem) -> Result<TrackedItem> {
        let mut items = self.items.lock().unwrap();
        let item = TrackedItem {
            id: items.iter().map(|i| i.id).max().unwrap_or(0) + 1,
            name: new.name.clone(),
            url: new.url.clone(),
            selector: new.selector.clone(),
            target_price: new.target_price,
            current_price: None,
            created_at: Utc::now(),
            last_checked_at: None,
            active: true,
            target_latch: TargetLatch::Armed,
            notify_to: new.notify_to.clone(),
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: &TrackedItem) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| anyhow!("no item {}", item.id))?;
        *slot = item.clone();
        Ok(())
    }

    async fn touch_last_checked(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| anyhow!("no item {id}"))?;
        slot.last_checked_at = Some(at);
        Ok(())
    }

    async fn append_record(&self, record: &PriceRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn records_for_item(&self, item_id: i64) -> Result<Vec<PriceRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        self.items.lock().unwrap().retain(|i| i.id != id);
        self.records.lock().unwrap().retain(|r| r.item_id != id);
        Ok(())
    }
}

/// Hands out scripted fetch responses in order; runs dry with an error.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<String>>>,
    pub fetched_urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            fetched_urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetched_urls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response")))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, Notification)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, item: &TrackedItem, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((item.id, notification.clone()));
        Ok(())
    }
}

pub fn item(id: i64, target_price: f64) -> TrackedItem {
    TrackedItem {
        id,
        name: format!("item-{id}"),
        url: format!("https://shop.example/p/{id}"),
        selector: None,
        target_price,
        current_price: None,
        created_at: Utc::now(),
        last_checked_at: None,
        active: true,
        target_latch: TargetLatch::Armed,
        notify_to: None,
    }
}

pub fn price_page(price: &str) -> String {
    format!(r#"<html><body><span class="price">{price}</span></body></html>"#)
}
