// ==========================================
// Tover - 引擎层
// ==========================================
// 职责: 实现指标计算规则,不拼 SQL
// 红线: Engine 不拼 SQL, 数据读取经 Repository
// ==========================================

pub mod critical_stock;
pub mod kpi;
pub mod order_book;
pub mod sales_window;

// 重导出核心引擎
pub use critical_stock::{CriticalStockEngine, ForecastService, CANCELLED_STATUS};
pub use kpi::KpiEngine;
pub use order_book::OrderBook;
pub use sales_window::{checked_window_start, fetch_lines_for_orders, round_dp, window_start};
