//! In-process order store with live subscriptions
//!
//! Behaves like the hosted store as seen from the display: every mutation
//! pushes a fresh snapshot with per-subscriber deltas, and `update` writes
//! through so the change comes back on the next snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared::feed::{FeedQuery, FeedSnapshot, sort_by_created_at};
use shared::models::OrderRecord;

use super::{FeedEvent, FeedSink, LiveFeed, SnapshotDiffer, Subscription};
use crate::{ClientError, ClientResult};

/// Live subscriber of the memory feed
struct MemorySubscriber {
    query: FeedQuery,
    differ: SnapshotDiffer,
    sink: FeedSink,
}

impl MemorySubscriber {
    /// Push the current view; `false` once the subscriber is gone
    fn publish(&mut self, documents: &[OrderRecord]) -> bool {
        let mut records: Vec<OrderRecord> = documents
            .iter()
            .filter(|r| self.query.matches(r))
            .cloned()
            .collect();
        sort_by_created_at(&mut records);

        let changes = self.differ.diff(&records);
        self.sink
            .send(FeedEvent::Snapshot(FeedSnapshot { records, changes }))
    }
}

#[derive(Default)]
struct MemoryStore {
    /// Insertion order is kept for equal timestamps
    documents: Vec<OrderRecord>,
    subscribers: Vec<MemorySubscriber>,
    fail_updates: bool,
    updates: Vec<(String, Map<String, Value>)>,
}

impl MemoryStore {
    fn publish(&mut self) {
        let documents = &self.documents;
        self.subscribers.retain_mut(|s| s.publish(documents));
    }

    fn position(&self, record_id: &str) -> Option<usize> {
        self.documents.iter().position(|r| r.order_id == record_id)
    }

    fn apply_patch(&mut self, record_id: &str, fields: &Map<String, Value>) -> ClientResult<()> {
        let index = self
            .position(record_id)
            .ok_or_else(|| ClientError::NotFound(format!("order {}", record_id)))?;

        let mut value = serde_json::to_value(&self.documents[index])?;
        if let Value::Object(ref mut object) = value {
            for (key, field) in fields {
                object.insert(key.clone(), field.clone());
            }
        }
        let mut patched: OrderRecord = serde_json::from_value(value)?;
        patched.order_id = record_id.to_string();
        self.documents[index] = patched;
        Ok(())
    }
}

/// In-memory [`LiveFeed`]
#[derive(Clone, Default)]
pub struct MemoryFeed {
    inner: Arc<Mutex<MemoryStore>>,
}

impl std::fmt::Debug for MemoryFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.inner.lock();
        f.debug_struct("MemoryFeed")
            .field("documents", &store.documents.len())
            .field("subscribers", &store.subscribers.len())
            .finish()
    }
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with records, without notifying anyone
    pub fn with_records(records: impl IntoIterator<Item = OrderRecord>) -> Self {
        let feed = Self::new();
        feed.inner.lock().documents.extend(records);
        feed
    }

    /// Insert or replace a record and notify subscribers
    pub fn insert(&self, record: OrderRecord) {
        let mut store = self.inner.lock();
        match store.position(&record.order_id) {
            Some(index) => store.documents[index] = record,
            None => store.documents.push(record),
        }
        store.publish();
    }

    /// Merge fields into a record and notify subscribers
    pub fn patch(&self, record_id: &str, fields: Map<String, Value>) -> ClientResult<()> {
        let mut store = self.inner.lock();
        store.apply_patch(record_id, &fields)?;
        store.publish();
        Ok(())
    }

    /// Delete a record and notify subscribers
    pub fn remove(&self, record_id: &str) -> Option<OrderRecord> {
        let mut store = self.inner.lock();
        let index = store.position(record_id)?;
        let record = store.documents.remove(index);
        store.publish();
        Some(record)
    }

    /// Deliver a subscription error to every subscriber
    pub fn inject_error(&self, message: impl Into<String>) {
        let message = message.into();
        let mut store = self.inner.lock();
        store
            .subscribers
            .retain(|s| s.sink.send(FeedEvent::Error(message.clone())));
    }

    /// Re-deliver the current result set (recovery after an error)
    pub fn republish(&self) {
        self.inner.lock().publish();
    }

    /// Make subsequent `update` calls fail
    pub fn fail_updates(&self, fail: bool) {
        self.inner.lock().fail_updates = fail;
    }

    /// Current copy of a record
    pub fn get(&self, record_id: &str) -> Option<OrderRecord> {
        let store = self.inner.lock();
        store.position(record_id).map(|i| store.documents[i].clone())
    }

    /// Every `update` call received, in order (including failed ones)
    pub fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.inner.lock().updates.clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut store = self.inner.lock();
        store.subscribers.retain(|s| !s.sink.is_closed());
        store.subscribers.len()
    }
}

#[async_trait]
impl LiveFeed for MemoryFeed {
    fn subscribe(&self, query: FeedQuery) -> Subscription {
        let (sink, subscription) = Subscription::channel();
        let mut subscriber = MemorySubscriber {
            query,
            differ: SnapshotDiffer::new(),
            sink,
        };

        let mut store = self.inner.lock();
        if subscriber.publish(&store.documents) {
            store.subscribers.push(subscriber);
        }
        subscription
    }

    async fn update(&self, record_id: &str, fields: Map<String, Value>) -> ClientResult<()> {
        let mut store = self.inner.lock();
        store.updates.push((record_id.to_string(), fields.clone()));

        if store.fail_updates {
            return Err(ClientError::Internal("update rejected".to_string()));
        }

        store.apply_patch(record_id, &fields)?;
        store.publish();
        Ok(())
    }
}
