//! Shared types for the kitchen display
//!
//! Record model, canonical kitchen stage and live-feed contract types used by
//! both the feed clients and the display.

pub mod feed;
pub mod models;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use feed::{ChangeType, DocumentChange, FeedQuery, FeedSnapshot};
pub use models::{KitchenItem, KitchenOrder, Modifier, OrderItemRecord, OrderRecord, RawTimestamp};
pub use order::{KitchenStage, StatusField};
