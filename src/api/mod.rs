// ==========================================
// Tover - API 层
// ==========================================
// 职责: 对外入口（导入、指标、订单），参数校验与错误转换
// 约定: 工作区 id 由启动配置注入，不在核心内写死
// ==========================================

pub mod error;
pub mod import_api;
pub mod metrics_api;
pub mod orders_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{clamp_page, ImportApi};
pub use metrics_api::MetricsApi;
pub use orders_api::OrdersApi;
