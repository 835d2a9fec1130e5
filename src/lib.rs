// ==========================================
// Tover - 核心库
// ==========================================
// 职责: 电商销售数据 CSV 导入校验、临界库存预测、KPI 汇总、订单浏览
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 指标计算
pub mod engine;

// 导入层 - CSV 文件
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ImportStatus, ImportType, RowErrorCode};

// 领域实体
pub use domain::{
    CriticalStockItem, ForecastParams, Import, ImportOutcome, ImportSummary, MetricsSummary,
    RowError,
};

// 引擎
pub use engine::{CriticalStockEngine, ForecastService, KpiEngine, OrderBook};

// 导入
pub use importer::{ImportPipeline, ImportPipelineImpl};

// API
pub use api::{ApiError, ImportApi, MetricsApi, OrdersApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "tover";
