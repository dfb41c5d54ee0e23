//! Live feed contract
//!
//! A subscription delivers, on every change, the full set of matching
//! records plus the deltas since the previous delivery.

use serde::{Deserialize, Serialize};

use crate::models::OrderRecord;

/// Default collection holding kitchen orders
pub const ORDERS_COLLECTION: &str = "orders";

/// Delta kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// One change notification for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub change_type: ChangeType,
    pub record: OrderRecord,
}

impl DocumentChange {
    pub fn added(record: OrderRecord) -> Self {
        Self {
            change_type: ChangeType::Added,
            record,
        }
    }

    pub fn modified(record: OrderRecord) -> Self {
        Self {
            change_type: ChangeType::Modified,
            record,
        }
    }

    pub fn removed(record: OrderRecord) -> Self {
        Self {
            change_type: ChangeType::Removed,
            record,
        }
    }
}

/// Full result set of a subscription plus deltas since the last delivery
///
/// `records` is ordered by `createdAt` ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub records: Vec<OrderRecord>,
    pub changes: Vec<DocumentChange>,
}

impl FeedSnapshot {
    /// Deltas of one kind
    pub fn changes_of(&self, change_type: ChangeType) -> impl Iterator<Item = &DocumentChange> {
        self.changes
            .iter()
            .filter(move |c| c.change_type == change_type)
    }
}

/// Subscription predicate: `createdAt >= created_since`, ordered by `createdAt`
///
/// Stage filtering is deliberately not part of the query; records carrying
/// only one of the two status vocabularies would otherwise be dropped
/// server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub collection: String,
    /// Lower bound on `createdAt` (unix millis, inclusive)
    pub created_since: i64,
}

impl FeedQuery {
    pub fn new(collection: impl Into<String>, created_since: i64) -> Self {
        Self {
            collection: collection.into(),
            created_since,
        }
    }

    /// Orders created since local midnight of `now`
    pub fn today(collection: impl Into<String>, now: chrono::DateTime<chrono::Local>) -> Self {
        Self::new(collection, start_of_local_day_millis(now))
    }

    /// Whether a record passes the predicate
    ///
    /// Records without a usable `createdAt` are kept: they are most likely
    /// just written and waiting for the server timestamp.
    pub fn matches(&self, record: &OrderRecord) -> bool {
        record
            .created_at_millis()
            .is_none_or(|millis| millis >= self.created_since)
    }
}

/// Local midnight of the given instant, in unix millis
pub fn start_of_local_day_millis(now: chrono::DateTime<chrono::Local>) -> i64 {
    use chrono::TimeZone;

    let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN);
    chrono::Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// Sort records ascending by `createdAt`; records without one go last
///
/// Stable, so equal timestamps keep their delivery order.
pub fn sort_by_created_at(records: &mut [OrderRecord]) {
    records.sort_by_key(|r| r.created_at_millis().map_or((1, 0), |millis| (0, millis)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTimestamp;
    use chrono::{Local, TimeZone};

    fn record(id: &str, created_at: Option<i64>) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            created_at: created_at.map(RawTimestamp::Millis),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_of_local_day() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let midnight = Local.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(start_of_local_day_millis(now), midnight.timestamp_millis());
    }

    #[test]
    fn test_query_matches() {
        let query = FeedQuery::new(ORDERS_COLLECTION, 1_000);
        assert!(query.matches(&record("a", Some(1_000))));
        assert!(query.matches(&record("b", Some(5_000))));
        assert!(!query.matches(&record("c", Some(999))));
        assert!(query.matches(&record("d", None)));
    }

    #[test]
    fn test_sort_by_created_at() {
        let mut records = vec![
            record("late", Some(3_000)),
            record("unknown", None),
            record("early", Some(1_000)),
            record("mid-1", Some(2_000)),
            record("mid-2", Some(2_000)),
        ];
        sort_by_created_at(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.order_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid-1", "mid-2", "late", "unknown"]);
    }

    #[test]
    fn test_changes_of() {
        let snapshot = FeedSnapshot {
            records: vec![],
            changes: vec![
                DocumentChange::added(record("a", None)),
                DocumentChange::modified(record("b", None)),
                DocumentChange::added(record("c", None)),
            ],
        };
        assert_eq!(snapshot.changes_of(ChangeType::Added).count(), 2);
        assert_eq!(snapshot.changes_of(ChangeType::Removed).count(), 0);
    }
}
