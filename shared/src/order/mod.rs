//! Kitchen stage lifecycle
//!
//! - [`KitchenStage`]: canonical stage, the only vocabulary the display reasons about
//! - [`StatusField`]: which stored field carries the stage for writes

pub mod stage;

// Re-exports
pub use stage::{KitchenStage, StatusField};
