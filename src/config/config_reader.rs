// ==========================================
// Tover - 配置读取 Trait
// ==========================================
// 职责: 定义导入与指标模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 每个落库批次的记录数
    ///
    /// # 默认值
    /// - 500
    async fn get_upsert_batch_size(&self) -> RepositoryResult<usize>;
}

// ==========================================
// ForecastConfigReader Trait
// ==========================================
// 用途: 临界库存预测与 KPI 汇总
// 实现者: ConfigManager
#[async_trait]
pub trait ForecastConfigReader: Send + Sync {
    /// 预测窗口 nDays（默认 14）
    async fn get_default_forecast_days(&self) -> RepositoryResult<i64>;

    /// 销量回看窗口 lookbackDays（默认 7）
    async fn get_default_lookback_days(&self) -> RepositoryResult<i64>;

    /// 返回条数上限（默认 50）
    async fn get_max_critical_items(&self) -> RepositoryResult<usize>;

    /// 按订单 id 批量查询订单行时每批的 id 数（默认 100）
    async fn get_lookup_batch_size(&self) -> RepositoryResult<usize>;

    /// KPI 汇总默认区间天数（默认 30）
    async fn get_default_range_days(&self) -> RepositoryResult<i64>;
}
