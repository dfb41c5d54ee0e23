//! KDS Client - live order feed for the kitchen display
//!
//! Provides the [`LiveFeed`] seam plus two implementations:
//! - [`PollingFeed`]: HTTP document endpoint, snapshots synthesized by diffing polls
//! - [`MemoryFeed`]: in-process document store (tests, demo mode)

pub mod config;
pub mod error;
pub mod feed;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use feed::{FeedEvent, FeedSink, LiveFeed, MemoryFeed, PollingFeed, SnapshotDiffer, Subscription};
pub use http::HttpClient;

// Re-export shared feed types for convenience
pub use shared::feed::{ChangeType, DocumentChange, FeedQuery, FeedSnapshot};
