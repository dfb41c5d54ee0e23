//! Order list reconciliation
//!
//! ```text
//!            snapshot                 error
//! Disconnected ───────▶ Connected ───────▶ Disconnected (orders kept)
//!      ▲                                        │
//!      └──────────────── snapshot ◀─────────────┘
//! ```
//!
//! Every snapshot fully replaces the board; there is no incremental patching,
//! so what is shown always equals the latest delivery minus delivered orders.

use std::collections::HashSet;

use kds_client::FeedEvent;
use shared::KitchenOrder;
use shared::feed::FeedSnapshot;

use super::AlertDecider;

/// Connectivity of the live feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// What one feed event changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Order ids whose `added` delta deserves a sound, one entry per delta
    pub alerts: Vec<String>,
}

impl ReconcileOutcome {
    pub fn should_ring(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Visible orders plus connectivity, driven only by feed events
#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    orders: Vec<KitchenOrder>,
    connection: ConnectionState,
    last_error: Option<String>,
    decider: AlertDecider,
}

impl OrderBoard {
    pub fn new(decider: AlertDecider) -> Self {
        Self {
            decider,
            ..Default::default()
        }
    }

    /// Apply any feed event
    pub fn apply(&mut self, event: &FeedEvent, now_ms: i64) -> ReconcileOutcome {
        match event {
            FeedEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot, now_ms),
            FeedEvent::Error(message) => {
                self.apply_error(message);
                ReconcileOutcome::default()
            }
        }
    }

    /// Replace the board with the snapshot's visible orders, in delivery order
    pub fn apply_snapshot(&mut self, snapshot: &FeedSnapshot, now_ms: i64) -> ReconcileOutcome {
        if self.connection == ConnectionState::Disconnected {
            tracing::info!("Order feed connected");
        }
        self.connection = ConnectionState::Connected;
        self.last_error = None;

        let mut seen = HashSet::with_capacity(snapshot.records.len());
        let mut hidden = 0usize;
        let orders: Vec<KitchenOrder> = snapshot
            .records
            .iter()
            .filter(|record| {
                let first = seen.insert(record.order_id.as_str());
                if !first {
                    tracing::warn!(order_id = %record.order_id, "Duplicate order in snapshot, keeping first");
                }
                first
            })
            .map(KitchenOrder::from)
            .filter(|order| {
                let visible = order.stage.is_visible();
                if !visible {
                    hidden += 1;
                }
                visible
            })
            .collect();

        let alerts: Vec<String> = snapshot
            .changes
            .iter()
            .filter(|change| self.decider.decide(change, now_ms))
            .map(|change| change.record.order_id.clone())
            .collect();

        for order_id in &alerts {
            tracing::info!(order_id = %order_id, "New order alert");
        }
        tracing::debug!(
            records = snapshot.records.len(),
            visible = orders.len(),
            delivered = hidden,
            changes = snapshot.changes.len(),
            "Snapshot reconciled"
        );

        self.orders = orders;
        ReconcileOutcome { alerts }
    }

    /// Mark the feed disconnected; the last board stays on screen
    pub fn apply_error(&mut self, message: &str) {
        tracing::error!(error = %message, visible = self.orders.len(), "Order feed error, keeping last known orders");
        self.connection = ConnectionState::Disconnected;
        self.last_error = Some(message.to_string());
    }

    /// Subscription torn down on purpose; orders stay until the next snapshot
    pub fn mark_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
    }

    pub fn orders(&self) -> &[KitchenOrder] {
        &self.orders
    }

    pub fn find(&self, order_id: &str) -> Option<&KitchenOrder> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
