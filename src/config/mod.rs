// ==========================================
// Tover - 配置层
// ==========================================
// 职责: 运行参数管理（批次大小、预测窗口等）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod config_reader;

// 重导出核心配置管理器
pub use config_manager::{config_defaults, config_keys, config_limits, ConfigManager};
pub use config_reader::{ForecastConfigReader, ImportConfigReader};
