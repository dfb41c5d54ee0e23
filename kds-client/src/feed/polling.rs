//! HTTP polling feed
//!
//! Polls `GET {base}/{collection}?createdSince=..&orderBy=createdAt` and
//! turns successive result sets into snapshots with deltas.
//!
//! # Delivery rules
//!
//! - first successful poll: snapshot, every record `added`
//! - later polls: snapshot only when something changed
//! - failure: one `Error` per failure streak, exponential backoff
//! - first success after a failure: snapshot even without changes

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::feed::{FeedQuery, FeedSnapshot, sort_by_created_at};
use shared::models::OrderRecord;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{FeedEvent, FeedSink, LiveFeed, SnapshotDiffer, Subscription};
use crate::{ClientConfig, ClientResult, HttpClient};

/// Live feed over a plain HTTP document endpoint
#[derive(Debug, Clone)]
pub struct PollingFeed {
    http: HttpClient,
    config: ClientConfig,
}

impl PollingFeed {
    /// Create a polling feed from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            config: config.clone(),
        })
    }

    /// Fetch the current result set for `query`, ordered by `createdAt`
    ///
    /// Records that fail to deserialize are skipped, not fatal.
    pub async fn fetch(&self, query: &FeedQuery) -> ClientResult<Vec<OrderRecord>> {
        let raw: Vec<Value> = self
            .http
            .get(
                &[query.collection.as_str()],
                &[
                    ("createdSince", query.created_since.to_string()),
                    ("orderBy", "createdAt".to_string()),
                ],
            )
            .await?;

        let mut records: Vec<OrderRecord> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<OrderRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed order record");
                    None
                }
            })
            .filter(|record| query.matches(record))
            .collect();

        sort_by_created_at(&mut records);
        Ok(records)
    }

    async fn run(self, query: FeedQuery, sink: FeedSink) {
        let mut differ = SnapshotDiffer::new();
        let mut delivered_once = false;
        let mut failing = false;
        let mut delay = self.config.poll_interval;

        info!(collection = %query.collection, since = query.created_since, "Polling feed started");

        loop {
            let result = tokio::select! {
                _ = sink.cancelled() => break,
                result = self.fetch(&query) => result,
            };

            match result {
                Ok(records) => {
                    let changes = differ.diff(&records);
                    if !delivered_once || failing || !changes.is_empty() {
                        debug!(
                            records = records.len(),
                            changes = changes.len(),
                            "Delivering snapshot"
                        );
                        if !sink.send(FeedEvent::Snapshot(FeedSnapshot { records, changes })) {
                            break;
                        }
                    }
                    if failing {
                        info!("Polling feed recovered");
                    }
                    delivered_once = true;
                    failing = false;
                    delay = self.config.poll_interval;
                }
                Err(e) if failing => {
                    delay = self.config.next_delay(delay);
                    debug!(error = %e, retry_in_ms = delay.as_millis() as u64, "Order feed still failing");
                }
                Err(e) => {
                    error!(error = %e, "Order feed poll failed");
                    if !sink.send(FeedEvent::Error(e.to_string())) {
                        break;
                    }
                    failing = true;
                    delay = self.config.poll_interval;
                }
            }

            tokio::select! {
                _ = sink.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(collection = %query.collection, "Polling feed stopped");
    }
}

#[async_trait]
impl LiveFeed for PollingFeed {
    fn subscribe(&self, query: FeedQuery) -> Subscription {
        let (sink, subscription) = Subscription::channel();
        tokio::spawn(self.clone().run(query, sink));
        subscription
    }

    async fn update(&self, record_id: &str, fields: Map<String, Value>) -> ClientResult<()> {
        debug!(record_id = %record_id, fields = ?fields.keys().collect::<Vec<_>>(), "Patching order");
        self.http
            .patch(&[self.config.collection.as_str(), record_id], &Value::Object(fields))
            .await
    }
}
