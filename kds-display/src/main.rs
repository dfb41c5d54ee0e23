use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kds_client::{LiveFeed, PollingFeed};
use kds_display::{Config, FeedMode, demo, init_logger, screen, setup_environment};
use tokio_util::sync::CancellationToken;

/// 演示模式下新订单间隔
const DEMO_ORDER_EVERY: Duration = Duration::from_secs(45);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv)
    setup_environment();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 日志 (界面日志面板 + 可选文件)
    init_logger(
        &config.log_level,
        config.json_logs(),
        config.log_dir.as_deref().map(Path::new),
    )?;
    config.validate()?;

    tracing::info!(
        station = %config.station_name,
        mode = ?config.feed_mode,
        environment = %config.environment,
        "KDS display starting"
    );

    // 4. 数据源
    let shutdown = CancellationToken::new();
    let feed: Arc<dyn LiveFeed> = match config.feed_mode {
        FeedMode::Http => Arc::new(PollingFeed::new(&config.client_config())?),
        FeedMode::Demo => {
            let feed = demo::seeded_feed();
            tokio::spawn(demo::generate_orders(
                Arc::clone(&feed),
                DEMO_ORDER_EVERY,
                shutdown.clone(),
            ));
            feed as Arc<dyn LiveFeed>
        }
    };

    // 5. 界面
    let res = screen::run(&config, feed).await;
    shutdown.cancel();

    if let Err(e) = &res {
        tracing::error!(error = %e, "KDS display stopped with error");
    }
    res?;
    Ok(())
}
