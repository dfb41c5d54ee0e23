//! Kitchen screen
//!
//! ```text
//! crossterm keys ─┐
//! feed pump ──────┼──▶ KdsApp ──▶ render::draw ──▶ terminal
//! write outcomes ─┤
//! timers ─────────┘
//! ```

pub mod app;
pub mod gate;
pub mod render;
pub mod runner;
pub mod sound;

pub use app::{AppChannels, KdsApp, Notice};
pub use gate::StartGate;
pub use runner::run;
pub use sound::{Notifier, RecordingNotifier, TerminalBell};
