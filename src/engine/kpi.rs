// ==========================================
// Tover - KPI 汇总引擎
// ==========================================
// 职责: 区间内 GMV / 销量 / 订单数 + 最新快照日库存成本
// 输入: 订单、订单行、库存快照
// 输出: MetricsSummary
// ==========================================

use crate::config::ForecastConfigReader;
use crate::domain::metrics::{DateRange, MetricsSummary, SalesKpis, SummaryMeta};
use crate::domain::records::{OrderLineFact, SnapshotFact};
use crate::engine::critical_stock::CANCELLED_STATUS;
use crate::engine::sales_window::{fetch_lines_for_orders, round_dp, window_start};
use crate::repository::error::RepositoryResult;
use crate::repository::SalesRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// 订单行汇总：(GMV, 销量)
pub fn aggregate_sales(lines: &[OrderLineFact]) -> (f64, i64) {
    lines.iter().fold((0.0, 0), |(gmv, units), line| {
        (
            gmv + line.quantity as f64 * line.unit_price_gross,
            units + line.quantity,
        )
    })
}

/// 库存成本 = Σ on_hand_qty × unit_cost
pub fn stock_value(snapshots: &[SnapshotFact]) -> f64 {
    snapshots.iter().map(|s| s.on_hand_qty * s.unit_cost).sum()
}

// ==========================================
// KpiEngine
// ==========================================
pub struct KpiEngine<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    sales_repo: Arc<S>,
    config: Arc<C>,
}

impl<S, C> KpiEngine<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    pub fn new(sales_repo: Arc<S>, config: Arc<C>) -> Self {
        Self { sales_repo, config }
    }

    /// 计算 KPI 汇总
    ///
    /// # 参数
    /// - from / to: 区间 [from, to)；缺省为 [now - 默认天数, now)
    /// - now: 当前时间
    #[instrument(skip(self))]
    pub async fn summarize(
        &self,
        workspace_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<MetricsSummary> {
        let to = to.unwrap_or(now);
        let from = match from {
            Some(f) => f,
            None => {
                let days = self.config.get_default_range_days().await?;
                window_start(to, days)
            }
        };

        // 销售指标
        let orders = self
            .sales_repo
            .fetch_orders_in_range(workspace_id, from, to, CANCELLED_STATUS)
            .await?;
        let order_ids: Vec<String> = orders.into_iter().map(|o| o.id).collect();

        let chunk_size = self.config.get_lookup_batch_size().await?;
        let lines = fetch_lines_for_orders(self.sales_repo.as_ref(), &order_ids, chunk_size).await?;
        let (gmv, units_sold) = aggregate_sales(&lines);

        // 库存成本（最新快照日）
        let snapshot_date = self.sales_repo.latest_snapshot_date(workspace_id).await?;
        let stock_value_cost = match snapshot_date {
            Some(date) => {
                let snaps = self.sales_repo.fetch_snapshots_on_date(workspace_id, date).await?;
                Some(round_dp(stock_value(&snaps), 2))
            }
            None => None,
        };

        let kpis = SalesKpis {
            gmv_gross: round_dp(gmv, 2),
            units_sold,
            orders_count: order_ids.len(),
            stock_value_cost,
            inventory_snapshot_date: snapshot_date,
        };
        info!(
            orders = kpis.orders_count,
            units = kpis.units_sold,
            gmv = kpis.gmv_gross,
            "KPI 汇总完成"
        );

        Ok(MetricsSummary {
            workspace_id: workspace_id.to_string(),
            range: DateRange { from, to },
            kpis,
            meta: SummaryMeta { computed_at: now },
        })
    }
}
