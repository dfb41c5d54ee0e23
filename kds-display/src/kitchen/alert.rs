//! Freshness & alert decision
//!
//! An `added` delta is not proof of new kitchen work: (re)subscribing
//! delivers the whole backlog as `added`. Only orders created inside the
//! freshness window ring.

use std::time::Duration;

use shared::KitchenStage;
use shared::feed::{ChangeType, DocumentChange};

/// Default freshness window
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Decides, per delta, whether to play the notification sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertDecider {
    window_ms: i64,
}

impl Default for AlertDecider {
    fn default() -> Self {
        Self::new(FRESHNESS_WINDOW)
    }
}

impl AlertDecider {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Core rule: `added`, created less than the window ago, not delivered
    ///
    /// A missing timestamp never alerts.
    pub fn should_alert(
        &self,
        change_type: ChangeType,
        created_at: Option<i64>,
        stage: KitchenStage,
        now_ms: i64,
    ) -> bool {
        if change_type != ChangeType::Added || stage == KitchenStage::Delivered {
            return false;
        }
        match created_at {
            Some(created_at) => now_ms.saturating_sub(created_at) < self.window_ms,
            None => false,
        }
    }

    /// Apply the rule to one feed delta
    pub fn decide(&self, change: &DocumentChange, now_ms: i64) -> bool {
        self.should_alert(
            change.change_type,
            change.record.created_at_millis(),
            change.record.stage(),
            now_ms,
        )
    }
}
