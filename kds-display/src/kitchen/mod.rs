//! Kitchen board logic
//!
//! - [`alert`]: whether a delta deserves the notification sound
//! - [`reconciler`]: feed events → visible, ordered board
//! - [`actuator`]: one tap → one forward stage write
//! - [`card`]: per-card display values (elapsed minutes, lines, action)

pub mod actuator;
pub mod alert;
pub mod card;
pub mod reconciler;

pub use actuator::{StageAction, StatusActuator, WriteFailure, WriteOutcome, stage_update};
pub use alert::{AlertDecider, FRESHNESS_WINDOW};
pub use card::{CardView, ItemLine, elapsed_minutes};
pub use reconciler::{ConnectionState, OrderBoard, ReconcileOutcome};
