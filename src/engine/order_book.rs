// ==========================================
// Tover - 订单浏览
// ==========================================
// 职责: 订单分页列表附带订单 GMV/件数 / 单个订单明细
// 输入: OrderRepository（订单、订单行）+ SalesRepository（分批订单行）
// 说明: 列表包含取消订单，与 KPI 口径不同
// ==========================================

use crate::config::ForecastConfigReader;
use crate::domain::orders::{OrderLineItem, OrderLines, OrderListItem};
use crate::domain::records::{OrderLineFact, StoredOrderLine};
use crate::engine::sales_window::{fetch_lines_for_orders, round_dp};
use crate::repository::error::RepositoryResult;
use crate::repository::{OrderRepository, SalesRepository};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 按订单汇总：order_id → (GMV, 件数)
pub fn order_totals(lines: &[OrderLineFact]) -> HashMap<String, (f64, i64)> {
    let mut totals: HashMap<String, (f64, i64)> = HashMap::new();
    for line in lines {
        let entry = totals.entry(line.order_id.clone()).or_insert((0.0, 0));
        entry.0 += line.quantity as f64 * line.unit_price_gross;
        entry.1 += line.quantity;
    }
    totals
}

fn to_line_item(line: StoredOrderLine) -> OrderLineItem {
    OrderLineItem {
        line_gmv: round_dp(line.quantity as f64 * line.unit_price_gross, 2),
        id: line.id,
        sku: line.sku,
        quantity: line.quantity,
        unit_price_gross: line.unit_price_gross,
        discount_amount: line.discount_amount,
        tax_amount: line.tax_amount,
    }
}

// ==========================================
// OrderBook
// ==========================================
pub struct OrderBook<S, C>
where
    S: SalesRepository + OrderRepository,
    C: ForecastConfigReader,
{
    repo: Arc<S>,
    config: Arc<C>,
}

impl<S, C> OrderBook<S, C>
where
    S: SalesRepository + OrderRepository,
    C: ForecastConfigReader,
{
    pub fn new(repo: Arc<S>, config: Arc<C>) -> Self {
        Self { repo, config }
    }

    /// 订单分页列表
    ///
    /// # 参数
    /// - from / to: 区间 [from, to)
    /// - limit / offset: 已归一化的分页参数
    ///
    /// # 返回
    /// - (当前页, 区间内订单总数)；当前页订单按 ordered_at 降序
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        workspace_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<OrderListItem>, usize)> {
        let (orders, total) = self
            .repo
            .list_orders(workspace_id, from, to, limit, offset)
            .await?;
        if orders.is_empty() {
            return Ok((Vec::new(), total));
        }

        let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        let chunk_size = self.config.get_lookup_batch_size().await?;
        let lines = fetch_lines_for_orders(self.repo.as_ref(), &order_ids, chunk_size).await?;
        let totals = order_totals(&lines);

        let items: Vec<OrderListItem> = orders
            .into_iter()
            .map(|o| {
                let (gmv, units) = totals.get(&o.id).copied().unwrap_or((0.0, 0));
                OrderListItem {
                    id: o.id,
                    source: o.source,
                    external_order_id: o.external_order_id,
                    ordered_at: o.ordered_at,
                    currency: o.currency,
                    status: o.status,
                    order_gmv: round_dp(gmv, 2),
                    order_units: units,
                }
            })
            .collect();

        debug!(page = items.len(), total = total, "订单列表完成");
        Ok((items, total))
    }

    /// 单个订单的订单行
    ///
    /// # 返回
    /// - Ok(None): 订单不存在或不属于该工作区
    pub async fn order_lines(&self, workspace_id: &str, order_id: &str) -> RepositoryResult<Option<OrderLines>> {
        if self.repo.get_order(workspace_id, order_id).await?.is_none() {
            return Ok(None);
        }

        let items = self
            .repo
            .list_order_lines(order_id)
            .await?
            .into_iter()
            .map(to_line_item)
            .collect();

        Ok(Some(OrderLines {
            order_id: order_id.to_string(),
            items,
        }))
    }
}
