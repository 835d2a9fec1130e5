// ==========================================
// Tover - 订单API
// ==========================================
// 职责: 订单分页列表 / 单个订单的订单行
// 约定: 区间缺省为最近 metrics.default_range_days 天；分页沿用导入列表的归一化
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::import_api::clamp_page;
use crate::api::metrics_api::parse_time_range;
use crate::config::ForecastConfigReader;
use crate::domain::import::Page;
use crate::domain::orders::{OrderLines, OrderListItem};
use crate::engine::{window_start, OrderBook};
use crate::repository::{OrderRepository, SalesRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 订单列表默认每页条数
pub const DEFAULT_ORDERS_LIMIT: usize = 50;

/// 订单API
pub struct OrdersApi<S, C>
where
    S: SalesRepository + OrderRepository,
    C: ForecastConfigReader,
{
    workspace_id: String,
    config: Arc<C>,
    book: OrderBook<S, C>,
}

impl<S, C> OrdersApi<S, C>
where
    S: SalesRepository + OrderRepository,
    C: ForecastConfigReader,
{
    /// 创建新的OrdersApi实例
    pub fn new(workspace_id: impl Into<String>, repo: Arc<S>, config: Arc<C>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            book: OrderBook::new(repo, config.clone()),
            config,
        }
    }

    fn resolve_workspace<'a>(&'a self, workspace_id: Option<&'a str>) -> &'a str {
        workspace_id
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .unwrap_or(&self.workspace_id)
    }

    /// 订单列表（最新在前）
    ///
    /// # 参数
    /// - from / to: 日期或时间戳文本，区间 [from, to)
    /// - limit / offset: 缺省 50 / 0
    pub async fn list_orders(
        &self,
        workspace_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ApiResult<Page<OrderListItem>> {
        self.list_orders_at(workspace_id, from, to, limit, offset, Utc::now())
            .await
    }

    /// 订单列表（指定当前时间）
    pub async fn list_orders_at(
        &self,
        workspace_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
        now: DateTime<Utc>,
    ) -> ApiResult<Page<OrderListItem>> {
        let (from, to) = parse_time_range(from, to)?;
        let to = to.unwrap_or(now);
        let from = match from {
            Some(f) => f,
            None => window_start(to, self.config.get_default_range_days().await?),
        };

        let (limit, offset) = clamp_page(limit, offset, DEFAULT_ORDERS_LIMIT);
        let (items, total) = self
            .book
            .list_orders(self.resolve_workspace(workspace_id), from, to, limit, offset)
            .await?;

        Ok(Page {
            limit,
            offset,
            total,
            items,
        })
    }

    /// 单个订单的订单行（按 SKU 升序）
    pub async fn list_order_lines(&self, workspace_id: Option<&str>, order_id: &str) -> ApiResult<OrderLines> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(ApiError::InvalidInput("订单 id 不能为空".to_string()));
        }

        self.book
            .order_lines(self.resolve_workspace(workspace_id), order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))
    }
}
