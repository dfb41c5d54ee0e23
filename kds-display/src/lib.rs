//! KDS Display - 厨房显示屏
//!
//! 实时展示当天待处理订单, 新订单提示音, 一键推进出餐状态。
//!
//! # 模块结构
//!
//! ```text
//! kds-display/src/
//! ├── core/      # 配置、错误
//! ├── kitchen/   # 提示音判定、订单列表调和、状态推进、卡片
//! ├── screen/    # 终端界面 (ratatui)
//! ├── utils/     # 日志、环境
//! └── demo.rs    # 演示数据源
//! ```

pub mod core;
pub mod demo;
pub mod kitchen;
pub mod screen;
pub mod utils;

// Re-export 公共类型
pub use core::{AppError, AppResult, Config, FeedMode};
pub use kitchen::{AlertDecider, CardView, OrderBoard, StatusActuator, WriteOutcome};
pub use screen::KdsApp;
pub use utils::{init_logger, setup_environment};
