use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::storage::Store;
use crate::tracker::models::{NewTrackedItem, PriceRecord, TargetLatch, TrackedItem};

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn item_from_row(row: &PgRow) -> Result<TrackedItem, sqlx::Error> {
    Ok(TrackedItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        selector: row.try_get("selector")?,
        target_price: row.try_get("target_price")?,
        current_price: row.try_get("current_price")?,
        created_at: row.try_get("created_at")?,
        last_checked_at: row.try_get("last_checked_at")?,
        active: row.try_get("active")?,
        target_latch: TargetLatch::from_flag(row.try_get("target_notified")?),
        notify_to: row.try_get("notify_to")?,
    })
}

fn record_from_row(row: &PgRow) -> Result<PriceRecord, sqlx::Error> {
    Ok(PriceRecord {
        item_id: row.try_get("item_id")?,
        price: row.try_get("price")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

#[async_trait]
impl Store for PgStorage {
    async fn item(&self, id: i64) -> Result<Option<TrackedItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, url, selector, target_price, current_price,
                   created_at, last_checked_at, active, target_notified, notify_to
            FROM tracked_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(item_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn active_items(&self) -> Result<Vec<TrackedItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, url, selector, target_price, current_price,
                   created_at, last_checked_at, active, target_notified, notify_to
            FROM tracked_items
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(item_from_row(row)?);
        }
        Ok(items)
    }

    async fn insert_item(&self, new: &NewTrackedItem) -> Result<TrackedItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO tracked_items (name, url, selector, target_price, notify_to)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, url, selector, target_price, current_price,
                      created_at, last_checked_at, active, target_notified, notify_to
            "#,
        )
        .bind(&new.name)
        .bind(&new.url)
        .bind(new.selector.as_deref())
        .bind(new.target_price)
        .bind(new.notify_to.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(item_from_row(&row)?)
    }

    async fn update_item(&self, item: &TrackedItem) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_items
            SET name = $2,
                url = $3,
                selector = $4,
                target_price = $5,
                current_price = $6,
                last_checked_at = $7,
                active = $8,
                target_notified = $9,
                notify_to = $10
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.url)
        .bind(item.selector.as_deref())
        .bind(item.target_price)
        .bind(item.current_price)
        .bind(item.last_checked_at)
        .bind(item.active)
        .bind(item.target_latch.as_flag())
        .bind(item.notify_to.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch_last_checked(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE tracked_items SET last_checked_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn append_record(&self, record: &PriceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_history (item_id, price, recorded_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.item_id)
        .bind(record.price)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn records_for_item(&self, item_id: i64) -> Result<Vec<PriceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, price, recorded_at
            FROM price_history
            WHERE item_id = $1
            ORDER BY recorded_at, id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        // price_history rows go with it via ON DELETE CASCADE.
        sqlx::query("DELETE FROM tracked_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
