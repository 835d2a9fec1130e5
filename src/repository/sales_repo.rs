// ==========================================
// Tover - 销售数据 Repository Trait
// ==========================================
// 职责: 订单 / 订单行 / 库存快照 / 支付的写入与读取接口
// 写入: 按自然键 upsert，每次调用一个事务
// 读取: 预测与 KPI 使用，非事务读
// ==========================================

use crate::domain::records::{
    InventorySnapshotRecord, OrderKey, OrderLineFact, OrderLineRecord, OrderRecord, OrderRef,
    PaymentRecord, SnapshotFact,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

// ==========================================
// SalesRepository Trait
// ==========================================
// 实现者: SalesRepositoryImpl（rusqlite）
#[async_trait]
pub trait SalesRepository: Send + Sync {
    // ===== 写入（单批次单事务）=====

    /// 订单 upsert，冲突键 (workspace_id, source, external_order_id)
    ///
    /// # 返回
    /// - Ok(usize): 写入（新增或更新）的记录数
    /// - Err: 整批回滚
    async fn upsert_orders(&self, workspace_id: &str, orders: &[OrderRecord]) -> RepositoryResult<usize>;

    /// 批量查找订单 id
    ///
    /// # 返回
    /// - 找到的 key → order_id；找不到的 key 不出现在结果中
    async fn find_order_ids(
        &self,
        workspace_id: &str,
        keys: &[OrderKey],
    ) -> RepositoryResult<HashMap<OrderKey, String>>;

    /// 订单行插入（无自然键，直接 INSERT）
    ///
    /// # 参数
    /// - lines: (order_id, 订单行)
    async fn insert_order_lines(&self, lines: &[(String, OrderLineRecord)]) -> RepositoryResult<usize>;

    /// 库存快照 upsert，冲突键 (workspace_id, snapshot_date, sku)
    async fn upsert_inventory_snapshots(
        &self,
        workspace_id: &str,
        snapshots: &[InventorySnapshotRecord],
    ) -> RepositoryResult<usize>;

    /// 支付 upsert，冲突键 (workspace_id, source, external_payment_id)
    async fn upsert_payments(&self, workspace_id: &str, payments: &[PaymentRecord]) -> RepositoryResult<usize>;

    // ===== 读取 =====

    /// 工作区全部库存快照，按 snapshot_date 降序
    async fn fetch_snapshots_by_workspace(&self, workspace_id: &str) -> RepositoryResult<Vec<SnapshotFact>>;

    /// 区间 [from, to) 内、状态不等于 exclude_status 的订单
    async fn fetch_orders_in_range(
        &self,
        workspace_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude_status: &str,
    ) -> RepositoryResult<Vec<OrderRef>>;

    /// 按订单 id 查询订单行（调用方负责分批）
    async fn fetch_order_lines_by_order_ids(&self, order_ids: &[String]) -> RepositoryResult<Vec<OrderLineFact>>;

    /// 最新快照日期（无快照时为 None）
    async fn latest_snapshot_date(&self, workspace_id: &str) -> RepositoryResult<Option<NaiveDate>>;

    /// 指定日期的全部快照
    async fn fetch_snapshots_on_date(
        &self,
        workspace_id: &str,
        snapshot_date: NaiveDate,
    ) -> RepositoryResult<Vec<SnapshotFact>>;
}
