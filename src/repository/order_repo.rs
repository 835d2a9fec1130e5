// ==========================================
// Tover - 订单浏览 Repository Trait
// ==========================================
// 职责: 订单分页列表 / 单个订单 / 订单明细行的读取接口
// 读取: 非事务读，结果按工作区隔离
// ==========================================

use crate::domain::records::{StoredOrder, StoredOrderLine};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// OrderRepository Trait
// ==========================================
// 实现者: SalesRepositoryImpl（与销售数据共用连接）
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 区间 [from, to) 内的订单（含取消订单），ordered_at 降序分页
    ///
    /// # 返回
    /// - (当前页, 区间内订单总数)
    async fn list_orders(
        &self,
        workspace_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<StoredOrder>, usize)>;

    /// 按 id 查询工作区内的订单
    async fn get_order(&self, workspace_id: &str, order_id: &str) -> RepositoryResult<Option<StoredOrder>>;

    /// 订单的全部订单行，按 SKU 升序
    async fn list_order_lines(&self, order_id: &str) -> RepositoryResult<Vec<StoredOrderLine>>;
}
