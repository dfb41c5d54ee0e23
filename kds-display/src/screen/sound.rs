//! Notification sound

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Plays the new-order sound
pub trait Notifier: Send {
    fn play(&mut self);
}

/// Rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn play(&mut self) {
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            tracing::warn!(error = %e, "Failed to ring terminal bell");
        }
    }
}

/// Counts plays instead of making noise
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    plays: Arc<AtomicUsize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn play(&mut self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}
