use chrono::{DateTime, Utc};

/// One monitored product page.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub selector: Option<String>,
    pub target_price: f64,
    pub current_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub target_latch: TargetLatch,
    pub notify_to: Option<String>,
}

/// Insert shape for a new item. Items start unchecked, active, and armed.
#[derive(Debug, Clone)]
pub struct NewTrackedItem {
    pub name: String,
    pub url: String,
    pub selector: Option<String>,
    pub target_price: f64,
    pub notify_to: Option<String>,
}

/// Below-target notification latch.
///
/// `Notified` holds only while the most recent price is strictly below the
/// target; any observation at or above target re-arms the latch, so the
/// alert can fire again on the next crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLatch {
    /// At or above target, or never below it: a crossing may notify.
    Armed,
    /// Below target and already notified for this streak.
    Notified,
}

impl TargetLatch {
    pub fn from_flag(notified: bool) -> Self {
        if notified {
            TargetLatch::Notified
        } else {
            TargetLatch::Armed
        }
    }

    pub fn as_flag(self) -> bool {
        self == TargetLatch::Notified
    }
}

/// Append-only price observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub item_id: i64,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Notification command handed to the `Notifier`.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PriceDrop { old_price: f64, new_price: f64 },
    TargetReached,
}
