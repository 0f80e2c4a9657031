use chrono::{DateTime, Utc};

use crate::tracker::models::{Notification, PriceRecord, TargetLatch, TrackedItem};

/// Result of applying one extracted price to an item.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub item: TrackedItem,
    pub record: PriceRecord,
    pub notifications: Vec<Notification>,
}

/// Applies a freshly extracted price to an item's tracking state.
///
/// Pure given its inputs. `new_price` must be positive; failed extractions
/// never reach this point. Produces the updated item, one history record,
/// and up to two notifications (target-reached first, then price-drop).
pub fn apply(mut item: TrackedItem, new_price: f64, now: DateTime<Utc>) -> CheckOutcome {
    let old_price = item.current_price;

    item.current_price = Some(new_price);
    item.last_checked_at = Some(now);

    let record = PriceRecord {
        item_id: item.id,
        price: new_price,
        recorded_at: now,
    };

    let mut notifications = Vec::new();

    let below_target = new_price < item.target_price;
    match item.target_latch {
        TargetLatch::Armed if below_target => {
            notifications.push(Notification::TargetReached);
            item.target_latch = TargetLatch::Notified;
        }
        TargetLatch::Notified if below_target => {
            // Latch left over from a price observed back at/above target
            // (e.g. the target was moved); this is a fresh crossing.
            if old_price.map_or(false, |old| old > 0.0 && old >= item.target_price) {
                notifications.push(Notification::TargetReached);
            }
        }
        TargetLatch::Notified => {
            item.target_latch = TargetLatch::Armed;
        }
        TargetLatch::Armed => {}
    }

    if let Some(old) = old_price {
        if old > 0.0 && new_price < old {
            notifications.push(Notification::PriceDrop {
                old_price: old,
                new_price,
            });
        }
    }

    CheckOutcome {
        item,
        record,
        notifications,
    }
}
