//! 工具模块

pub mod logger;

pub use logger::{cleanup_old_logs, init_logger};

/// 加载 .env (文件不存在时忽略)
pub fn setup_environment() {
    if dotenv::dotenv().is_ok() {
        tracing::debug!("Loaded .env");
    }
}
