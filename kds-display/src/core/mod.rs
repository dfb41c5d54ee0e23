//! 核心模块 - 配置与错误

pub mod config;
pub mod error;

pub use config::{Config, FeedMode};
pub use error::{AppError, AppResult};
