pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::tracker::models::{NewTrackedItem, PriceRecord, TrackedItem};

/// Persistence contract for tracked items and their price history.
#[async_trait]
pub trait Store: Send + Sync {
    async fn item(&self, id: i64) -> Result<Option<TrackedItem>>;

    /// Active items in stable id order.
    async fn active_items(&self) -> Result<Vec<TrackedItem>>;

    async fn insert_item(&self, new: &NewTrackedItem) -> Result<TrackedItem>;

    async fn update_item(&self, item: &TrackedItem) -> Result<()>;

    /// Marks a fetch attempt even when no price was obtained.
    async fn touch_last_checked(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    async fn append_record(&self, record: &PriceRecord) -> Result<()>;

    /// History for one item in chronological order.
    async fn records_for_item(&self, item_id: i64) -> Result<Vec<PriceRecord>>;

    /// Removes an item together with all of its history.
    async fn delete_item(&self, id: i64) -> Result<()>;
}
