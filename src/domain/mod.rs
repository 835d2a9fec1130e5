// ==========================================
// Tover - 领域模型层
// ==========================================
// 职责: 定义导入、业务记录、指标、订单浏览相关的实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod import;
pub mod metrics;
pub mod orders;
pub mod records;
pub mod types;

// 重导出核心类型
pub use import::{
    Import, ImportErrorEntry, ImportOutcome, ImportSummary, Page, RawRow, RowError,
    Validated, ValidationResult,
};
pub use metrics::{CriticalStockItem, DateRange, ForecastParams, MetricsSummary, SalesKpis, SummaryMeta};
pub use orders::{OrderLineItem, OrderLines, OrderListItem};
pub use records::{
    InventorySnapshotRecord, OrderKey, OrderLineFact, OrderLineRecord, OrderRecord, OrderRef,
    PaymentRecord, SnapshotFact, StoredOrder, StoredOrderLine,
};
pub use types::{ImportStatus, ImportType, RowErrorCode};
