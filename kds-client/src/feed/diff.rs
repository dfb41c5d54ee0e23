//! Snapshot diffing
//!
//! Turns successive full result sets into `added` / `modified` / `removed`
//! deltas, the way a live query reports them.

use std::collections::{HashMap, HashSet};

use shared::feed::DocumentChange;
use shared::models::OrderRecord;

/// Remembers the last delivered result set, keyed by `orderId`
#[derive(Debug, Default, Clone)]
pub struct SnapshotDiffer {
    known: HashMap<String, OrderRecord>,
}

impl SnapshotDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute deltas against the previous result set and remember `records`
    ///
    /// Added and modified deltas follow the order of `records`; removed ones
    /// come last, ordered by id. A repeated id only counts once and the first
    /// occurrence wins, the same rule the board applies when rendering.
    pub fn diff(&mut self, records: &[OrderRecord]) -> Vec<DocumentChange> {
        let mut latest: HashMap<&str, &OrderRecord> = HashMap::with_capacity(records.len());
        for record in records {
            latest.entry(record.order_id.as_str()).or_insert(record);
        }

        let mut changes = Vec::new();
        let mut emitted: HashSet<&str> = HashSet::with_capacity(latest.len());
        for record in records {
            let id = record.order_id.as_str();
            if !emitted.insert(id) {
                continue;
            }
            let current = latest[id];
            match self.known.get(id) {
                None => changes.push(DocumentChange::added(current.clone())),
                Some(previous) if previous != current => {
                    changes.push(DocumentChange::modified(current.clone()))
                }
                Some(_) => {}
            }
        }

        let mut removed: Vec<&OrderRecord> = self
            .known
            .values()
            .filter(|r| !latest.contains_key(r.order_id.as_str()))
            .collect();
        removed.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        changes.extend(removed.into_iter().cloned().map(DocumentChange::removed));

        self.known = latest
            .into_iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect();

        changes
    }

    /// Forget everything; the next result set reports as all `added`
    pub fn reset(&mut self) {
        self.known.clear();
    }

    /// Number of records currently known
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
