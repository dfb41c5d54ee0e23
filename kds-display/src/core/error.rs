//! Application error types

use kds_client::ClientError;
use thiserror::Error;

/// Errors that can stop the display from starting
///
/// Once running, feed and write failures never surface here: they become
/// screen state and log lines.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal setup or drawing failed
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Feed client could not be built
    #[error("Feed client error: {0}")]
    Client(#[from] ClientError),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type for application setup
pub type AppResult<T> = Result<T, AppError>;
