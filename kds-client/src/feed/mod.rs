//! Live feed seam
//!
//! ```text
//!   LiveFeed::subscribe(query) ──▶ Subscription ──recv()──▶ FeedEvent
//!            │                          │
//!            ▼                          └── drop / unsubscribe() cancels the producer
//!   PollingFeed | MemoryFeed
//! ```

mod diff;
mod memory;
mod polling;

pub use diff::SnapshotDiffer;
pub use memory::MemoryFeed;
pub use polling::PollingFeed;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::feed::{FeedQuery, FeedSnapshot};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ClientResult;

/// One delivery on a subscription
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Current result set plus deltas
    Snapshot(FeedSnapshot),
    /// Delivery failed; the producer keeps trying
    Error(String),
}

/// Hosted order store, consumed through its contract only
#[async_trait]
pub trait LiveFeed: Send + Sync + 'static {
    /// Start a subscription; events flow until the handle is dropped
    fn subscribe(&self, query: FeedQuery) -> Subscription;

    /// Partial update of one record
    async fn update(&self, record_id: &str, fields: Map<String, Value>) -> ClientResult<()>;
}

/// Consumer side of a subscription
///
/// Dropping it tears the subscription down.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<FeedEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Create a connected producer/consumer pair
    pub fn channel() -> (FeedSink, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        (
            FeedSink {
                tx,
                cancel: cancel.clone(),
            },
            Subscription { rx, cancel },
        )
    }

    /// Next event, `None` once the producer is gone
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<FeedEvent> {
        self.rx.try_recv().ok()
    }

    /// Tear the subscription down
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Producer side of a subscription
#[derive(Debug, Clone)]
pub struct FeedSink {
    tx: mpsc::UnboundedSender<FeedEvent>,
    cancel: CancellationToken,
}

impl FeedSink {
    /// Deliver an event; `false` once the subscriber is gone
    pub fn send(&self, event: FeedEvent) -> bool {
        !self.is_closed() && self.tx.send(event).is_ok()
    }

    /// Whether the subscriber has unsubscribed
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves when the subscriber unsubscribes
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_cancels_sink() {
        let (sink, mut sub) = Subscription::channel();
        assert!(sink.send(FeedEvent::Error("boom".into())));
        assert_eq!(sub.recv().await, Some(FeedEvent::Error("boom".into())));

        sub.unsubscribe();
        assert!(sink.is_closed());
        assert!(!sink.send(FeedEvent::Error("late".into())));
        // Resolves immediately once cancelled
        sink.cancelled().await;
    }

    #[tokio::test]
    async fn test_recv_ends_when_producer_dropped() {
        let (sink, mut sub) = Subscription::channel();
        drop(sink);
        assert_eq!(sub.recv().await, None);
    }
}
