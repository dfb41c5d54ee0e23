//! Data models
//!
//! `*Record` types mirror the stored documents as-is (every schema revision
//! deserializes). `KitchenOrder` is the ingested form the display works with.

pub mod order;
pub mod timestamp;

// Re-exports
pub use order::*;
pub use timestamp::RawTimestamp;
