use std::time::Duration;

use kds_client::ClientConfig;
use shared::StatusField;

use super::{AppError, AppResult};

/// 订单数据源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// HTTP 轮询文档服务
    #[default]
    Http,
    /// 内存数据源 + 模拟订单 (演示)
    Demo,
}

impl FeedMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "demo" | "memory" => Some(Self::Demo),
            _ => None,
        }
    }
}

/// 厨房显示屏配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | FEED_MODE | http | 数据源: http / demo |
/// | FEED_BASE_URL | http://localhost:8080 | 文档服务地址 |
/// | FEED_TOKEN | - | Bearer token |
/// | FEED_COLLECTION | orders | 订单集合 |
/// | POLL_INTERVAL_MS | 2000 | 轮询间隔(毫秒) |
/// | REQUEST_TIMEOUT_MS | 10000 | 请求超时(毫秒) |
/// | RECONNECT_MAX_DELAY_MS | 30000 | 失败退避上限(毫秒) |
/// | STATUS_FIELD | kitchenStatus | 写入字段: kitchenStatus / status |
/// | FRESHNESS_WINDOW_SECS | 600 | 新订单提示音窗口(秒) |
/// | LATE_AFTER_MINUTES | 10 | 超时标记阈值(分钟) |
/// | ELAPSED_REFRESH_SECS | 30 | 等待时间刷新间隔(秒) |
/// | STATION_NAME | Main Kitchen | 工位名称 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志文件目录 |
/// | LOG_JSON | false | 文件日志使用 JSON (production 环境始终开启) |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// FEED_BASE_URL=http://pos.local:8080 STATUS_FIELD=status cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据源
    pub feed_mode: FeedMode,
    /// 文档服务地址
    pub feed_base_url: String,
    /// Bearer token
    pub feed_token: Option<String>,
    /// 订单集合
    pub feed_collection: String,
    /// 轮询间隔 (毫秒)
    pub poll_interval_ms: u64,
    /// 请求超时 (毫秒)
    pub request_timeout_ms: u64,
    /// 失败退避上限 (毫秒)
    pub reconnect_max_delay_ms: u64,
    /// 状态写入字段
    pub status_field: StatusField,
    /// 新订单提示音窗口 (秒)
    pub freshness_window_secs: u64,
    /// 超时标记阈值 (分钟)
    pub late_after_minutes: u64,
    /// 等待时间刷新间隔 (秒)
    pub elapsed_refresh_secs: u64,
    /// 工位名称
    pub station_name: String,
    /// 日志级别
    pub log_level: String,
    /// 日志文件目录
    pub log_dir: Option<String>,
    /// 文件日志使用 JSON
    pub log_json: bool,
    /// 运行环境: development | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的值使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置 (测试用)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let feed_mode = match lookup("FEED_MODE") {
            Some(value) => FeedMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown FEED_MODE, using http");
                FeedMode::Http
            }),
            None => FeedMode::default(),
        };

        let status_field = match lookup("STATUS_FIELD") {
            Some(value) => StatusField::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown STATUS_FIELD, using kitchenStatus");
                StatusField::KitchenStatus
            }),
            None => StatusField::default(),
        };

        Self {
            feed_mode,
            feed_base_url: text("FEED_BASE_URL", "http://localhost:8080"),
            feed_token: lookup("FEED_TOKEN").filter(|t| !t.trim().is_empty()),
            feed_collection: text("FEED_COLLECTION", shared::feed::ORDERS_COLLECTION),
            poll_interval_ms: number("POLL_INTERVAL_MS", 2000),
            request_timeout_ms: number("REQUEST_TIMEOUT_MS", 10000),
            reconnect_max_delay_ms: number("RECONNECT_MAX_DELAY_MS", 30000),
            status_field,
            freshness_window_secs: number("FRESHNESS_WINDOW_SECS", 600),
            late_after_minutes: number("LATE_AFTER_MINUTES", 10),
            elapsed_refresh_secs: number("ELAPSED_REFRESH_SECS", 30),
            station_name: text("STATION_NAME", "Main Kitchen"),
            log_level: text("LOG_LEVEL", "info"),
            log_dir: lookup("LOG_DIR").filter(|d| !d.trim().is_empty()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false),
            environment: text("ENVIRONMENT", "development"),
        }
    }

    /// 启动前校验
    pub fn validate(&self) -> AppResult<()> {
        if self.feed_mode == FeedMode::Http
            && !(self.feed_base_url.starts_with("http://")
                || self.feed_base_url.starts_with("https://"))
        {
            return Err(AppError::config(format!(
                "FEED_BASE_URL must be an http(s) URL, got '{}'",
                self.feed_base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::config("POLL_INTERVAL_MS must be greater than 0"));
        }
        if self.elapsed_refresh_secs == 0 {
            return Err(AppError::config("ELAPSED_REFRESH_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// 数据源客户端配置
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.feed_base_url)
            .with_collection(&self.feed_collection)
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_reconnect_delay(Duration::from_millis(self.reconnect_max_delay_ms));

        match &self.feed_token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }

    /// 新订单提示音窗口
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// 等待时间刷新间隔
    pub fn elapsed_refresh(&self) -> Duration {
        Duration::from_secs(self.elapsed_refresh_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 文件日志是否使用 JSON
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
