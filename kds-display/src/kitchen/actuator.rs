//! Status transition actuator
//!
//! One tap issues one single-field write moving the order one stage forward.
//! Nothing local changes on tap: the card only moves when the write comes
//! back through the feed. Failed writes are not retried; they are logged and
//! reported back as a [`WriteOutcome::Failed`] so the screen can show a notice.

use std::sync::Arc;

use kds_client::LiveFeed;
use serde_json::{Map, Value};
use shared::{KitchenOrder, KitchenStage, StatusField};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The single forward action available on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageAction {
    pub from: KitchenStage,
    pub target: KitchenStage,
    pub label: &'static str,
}

impl StageAction {
    /// Action offered for a stage; none once delivered
    pub fn for_stage(stage: KitchenStage) -> Option<Self> {
        let label = match stage {
            KitchenStage::Queued => "COOK",
            KitchenStage::Preparing => "FINISH",
            KitchenStage::Ready => "DELIVERED",
            KitchenStage::Delivered => return None,
        };
        stage.next().map(|target| Self {
            from: stage,
            target,
            label,
        })
    }
}

/// Partial update writing `target` into the configured field only
pub fn stage_update(field: StatusField, target: KitchenStage) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        field.field_name().to_string(),
        Value::String(field.token(target).to_string()),
    );
    fields
}

/// A write that did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub order_id: String,
    pub order_number: String,
    pub target: KitchenStage,
    pub error: String,
}

/// Completion of a fire-and-forget write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied {
        order_id: String,
        target: KitchenStage,
    },
    Failed(WriteFailure),
}

/// Issues stage writes against the feed
#[derive(Clone)]
pub struct StatusActuator {
    feed: Arc<dyn LiveFeed>,
    field: StatusField,
    outcomes: mpsc::UnboundedSender<WriteOutcome>,
}

impl std::fmt::Debug for StatusActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusActuator")
            .field("field", &self.field)
            .finish()
    }
}

impl StatusActuator {
    /// Create an actuator and the receiver for write completions
    pub fn new(
        feed: Arc<dyn LiveFeed>,
        field: StatusField,
    ) -> (Self, mpsc::UnboundedReceiver<WriteOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        (
            Self {
                feed,
                field,
                outcomes,
            },
            rx,
        )
    }

    pub fn field(&self) -> StatusField {
        self.field
    }

    /// Advance `order` one stage
    ///
    /// Returns `None` when the stage has no forward action. The write runs in
    /// the background; the returned handle is only useful to await it.
    pub fn advance(&self, order: &KitchenOrder) -> Option<JoinHandle<()>> {
        let action = StageAction::for_stage(order.stage)?;
        let fields = stage_update(self.field, action.target);

        let feed = Arc::clone(&self.feed);
        let outcomes = self.outcomes.clone();
        let order_id = order.order_id.clone();
        let order_number = order.number_label();

        tracing::info!(
            order_id = %order_id,
            from = %action.from,
            to = %action.target,
            field = self.field.field_name(),
            "Advancing order"
        );

        Some(tokio::spawn(async move {
            let outcome = match feed.update(&order_id, fields).await {
                Ok(()) => WriteOutcome::Applied {
                    order_id,
                    target: action.target,
                },
                Err(e) => {
                    tracing::error!(
                        order_id = %order_id,
                        to = %action.target,
                        error = %e,
                        "Status update failed, not retrying"
                    );
                    WriteOutcome::Failed(WriteFailure {
                        order_id,
                        order_number,
                        target: action.target,
                        error: e.to_string(),
                    })
                }
            };
            // Receiver gone means the screen is shutting down
            let _ = outcomes.send(outcome);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kds_client::{FeedEvent, FeedQuery, MemoryFeed};
    use serde_json::json;
    use shared::models::{OrderRecord, RawTimestamp};

    fn record(id: &str, kitchen: Option<&str>) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            order_number: 12,
            created_at: Some(RawTimestamp::Millis(1_000)),
            legacy_status: Some("paid".into()),
            kitchen_status: kitchen.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_action_per_stage() {
        let queued = StageAction::for_stage(KitchenStage::Queued).unwrap();
        assert_eq!(queued.target, KitchenStage::Preparing);
        assert_eq!(queued.label, "COOK");

        let preparing = StageAction::for_stage(KitchenStage::Preparing).unwrap();
        assert_eq!(preparing.target, KitchenStage::Ready);

        let ready = StageAction::for_stage(KitchenStage::Ready).unwrap();
        assert_eq!(ready.target, KitchenStage::Delivered);

        assert!(StageAction::for_stage(KitchenStage::Delivered).is_none());
    }

    #[test]
    fn test_stage_update_writes_one_field() {
        let fields = stage_update(StatusField::KitchenStatus, KitchenStage::Ready);
        assert_eq!(Value::Object(fields), json!({"kitchenStatus": "ready"}));

        let fields = stage_update(StatusField::Status, KitchenStage::Ready);
        assert_eq!(Value::Object(fields), json!({"status": "READY"}));
    }

    #[tokio::test]
    async fn test_advance_preparing_writes_ready() {
        let feed = MemoryFeed::with_records([record("o1", Some("preparing"))]);
        let (actuator, mut outcomes) =
            StatusActuator::new(Arc::new(feed.clone()), StatusField::KitchenStatus);

        let order = KitchenOrder::from(record("o1", Some("preparing")));
        actuator.advance(&order).unwrap().await.unwrap();

        let updates = feed.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "o1");
        assert_eq!(Value::Object(updates[0].1.clone()), json!({"kitchenStatus": "ready"}));

        // Local copy untouched
        assert_eq!(order.stage, KitchenStage::Preparing);
        assert_eq!(
            outcomes.recv().await,
            Some(WriteOutcome::Applied {
                order_id: "o1".into(),
                target: KitchenStage::Ready
            })
        );
    }

    #[tokio::test]
    async fn test_legacy_field_write() {
        let feed = MemoryFeed::with_records([record("o1", None)]);
        let (actuator, _outcomes) =
            StatusActuator::new(Arc::new(feed.clone()), StatusField::Status);

        let order = KitchenOrder::from(record("o1", None));
        actuator.advance(&order).unwrap().await.unwrap();

        assert_eq!(
            Value::Object(feed.updates()[0].1.clone()),
            json!({"status": "PREPARING"})
        );
        assert_eq!(feed.get("o1").unwrap().legacy_status.as_deref(), Some("PREPARING"));
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_not_retried() {
        let feed = MemoryFeed::with_records([record("o1", Some("queued"))]);
        let mut sub = feed.subscribe(FeedQuery::new("orders", 0));
        let _ = sub.try_recv();
        feed.fail_updates(true);

        let (actuator, mut outcomes) =
            StatusActuator::new(Arc::new(feed.clone()), StatusField::KitchenStatus);
        actuator
            .advance(&KitchenOrder::from(record("o1", Some("queued"))))
            .unwrap()
            .await
            .unwrap();

        match outcomes.recv().await {
            Some(WriteOutcome::Failed(failure)) => {
                assert_eq!(failure.order_id, "o1");
                assert_eq!(failure.order_number, "#012");
                assert_eq!(failure.target, KitchenStage::Preparing);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(feed.updates().len(), 1);
        // No snapshot: the card keeps showing its previous stage
        assert!(!matches!(sub.try_recv(), Some(FeedEvent::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_delivered_has_no_action() {
        let feed = MemoryFeed::new();
        let (actuator, _outcomes) = StatusActuator::new(Arc::new(feed.clone()), StatusField::KitchenStatus);
        let order = KitchenOrder::from(record("o1", Some("delivered")));
        assert!(actuator.advance(&order).is_none());
        assert!(feed.updates().is_empty());
    }
}
