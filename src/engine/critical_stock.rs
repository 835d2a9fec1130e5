// ==========================================
// Tover - 临界库存预测引擎
// ==========================================
// 职责: 估算每个 SKU 的可售天数，筛出窗口内会售罄的 SKU
// 输入: 库存快照（按日期降序）+ 回看窗口内非取消订单的订单行
// 输出: Vec<CriticalStockItem>（最紧急在前）
// 红线: 零销量 SKU 不算临界（无限可售期）
// ==========================================

use crate::config::{config_limits, ForecastConfigReader};
use crate::domain::metrics::{CriticalStockItem, ForecastParams};
use crate::domain::records::{OrderLineFact, SnapshotFact};
use crate::engine::sales_window::{fetch_lines_for_orders, round_dp, window_start};
use crate::repository::error::RepositoryResult;
use crate::repository::SalesRepository;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 不计入销量的订单状态
pub const CANCELLED_STATUS: &str = "cancelled";

// ==========================================
// CriticalStockEngine - 纯计算
// ==========================================
pub struct CriticalStockEngine;

impl CriticalStockEngine {
    /// 每个 SKU 只保留扫描中第一次出现的快照
    ///
    /// 输入需已按 snapshot_date 降序，第一次出现即最新
    pub fn latest_snapshot_per_sku(&self, snapshots: Vec<SnapshotFact>) -> Vec<SnapshotFact> {
        let mut seen = HashSet::new();
        snapshots
            .into_iter()
            .filter(|s| seen.insert(s.sku.clone()))
            .collect()
    }

    /// 按 SKU 汇总销量
    pub fn units_sold_by_sku(&self, lines: &[OrderLineFact]) -> HashMap<String, i64> {
        let mut sold: HashMap<String, i64> = HashMap::new();
        for line in lines {
            *sold.entry(line.sku.clone()).or_insert(0) += line.quantity;
        }
        sold
    }

    /// 计算临界库存列表
    ///
    /// - avg = 销量 / max(lookback, 1)
    /// - avg > 0 且 on_hand / avg <= n_days 时纳入
    /// - 按 days_remaining 升序（同值按 SKU），截断到 max_items（不超过 50）
    pub fn evaluate(
        &self,
        latest: &[SnapshotFact],
        sold: &HashMap<String, i64>,
        params: &ForecastParams,
    ) -> Vec<CriticalStockItem> {
        let window = params.lookback_days.max(1) as f64;

        let mut items: Vec<CriticalStockItem> = latest
            .iter()
            .filter_map(|snap| {
                let total_sold = sold.get(&snap.sku).copied().unwrap_or(0);
                let avg_per_day = total_sold as f64 / window;
                if avg_per_day <= 0.0 {
                    return None;
                }

                let days_remaining = snap.on_hand_qty / avg_per_day;
                if days_remaining > params.n_days as f64 {
                    return None;
                }

                Some(CriticalStockItem {
                    sku: snap.sku.clone(),
                    on_hand_qty: snap.on_hand_qty,
                    avg_units_per_day: round_dp(avg_per_day, 2),
                    days_remaining: round_dp(days_remaining, 1),
                })
            })
            .collect();

        items.sort_by(|a, b| {
            a.days_remaining
                .total_cmp(&b.days_remaining)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        items.truncate(params.max_items.min(config_limits::FORECAST_MAX_ITEMS));
        items
    }
}

// ==========================================
// ForecastService - 读取数据并调用引擎
// ==========================================
pub struct ForecastService<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    sales_repo: Arc<S>,
    config: Arc<C>,
    engine: CriticalStockEngine,
}

impl<S, C> ForecastService<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    pub fn new(sales_repo: Arc<S>, config: Arc<C>) -> Self {
        Self {
            sales_repo,
            config,
            engine: CriticalStockEngine,
        }
    }

    /// 临界库存查询
    ///
    /// # 参数
    /// - workspace_id: 工作区
    /// - params: 窗口参数（调用方已校验非负）
    /// - now: 回看窗口终点
    ///
    /// # 说明
    /// 快照与订单两次读取之间无事务，导入进行中时结果可能反映部分更新
    #[instrument(skip(self), fields(n_days = params.n_days, lookback_days = params.lookback_days))]
    pub async fn critical_stock(
        &self,
        workspace_id: &str,
        params: ForecastParams,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<CriticalStockItem>> {
        // 1. 每个 SKU 的最新快照
        let snapshots = self.sales_repo.fetch_snapshots_by_workspace(workspace_id).await?;
        if snapshots.is_empty() {
            debug!("无库存快照");
            return Ok(Vec::new());
        }
        let latest = self.engine.latest_snapshot_per_sku(snapshots);

        // 2. 回看窗口内的非取消订单
        let from = window_start(now, params.lookback_days);
        let orders = self
            .sales_repo
            .fetch_orders_in_range(workspace_id, from, now, CANCELLED_STATUS)
            .await?;
        let order_ids: Vec<String> = orders.into_iter().map(|o| o.id).collect();

        // 3. 分批汇总销量
        let chunk_size = self.config.get_lookup_batch_size().await?;
        let lines = fetch_lines_for_orders(self.sales_repo.as_ref(), &order_ids, chunk_size).await?;
        let sold = self.engine.units_sold_by_sku(&lines);

        // 4-6. 计算、排序、截断
        let items = self.engine.evaluate(&latest, &sold, &params);

        info!(
            skus = latest.len(),
            orders = order_ids.len(),
            critical = items.len(),
            "临界库存计算完成"
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snap(sku: &str, day: u32, qty: f64) -> SnapshotFact {
        SnapshotFact {
            sku: sku.to_string(),
            snapshot_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            on_hand_qty: qty,
            unit_cost: 1.0,
        }
    }

    fn sold(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn params(n_days: i64, lookback_days: i64) -> ForecastParams {
        ForecastParams {
            n_days,
            lookback_days,
            max_items: 50,
        }
    }

    #[test]
    fn test_latest_snapshot_first_seen_wins() {
        let snaps = vec![snap("A", 10, 5.0), snap("B", 9, 7.0), snap("A", 3, 99.0)];
        let latest = CriticalStockEngine.latest_snapshot_per_sku(snaps);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].on_hand_qty, 5.0);
    }

    #[test]
    fn test_units_sold_by_sku() {
        let lines = vec![
            OrderLineFact { order_id: "o1".into(), sku: "A".into(), quantity: 2, unit_price_gross: 1.0 },
            OrderLineFact { order_id: "o2".into(), sku: "A".into(), quantity: 3, unit_price_gross: 1.0 },
            OrderLineFact { order_id: "o2".into(), sku: "B".into(), quantity: 1, unit_price_gross: 1.0 },
        ];
        let s = CriticalStockEngine.units_sold_by_sku(&lines);
        assert_eq!(s["A"], 5);
        assert_eq!(s["B"], 1);
    }

    #[test]
    fn test_forecast_math_boundary() {
        let latest = vec![snap("A", 1, 70.0)];
        let s = sold(&[("A", 7)]);

        let included = CriticalStockEngine.evaluate(&latest, &s, &params(70, 7));
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].avg_units_per_day, 1.0);
        assert_eq!(included[0].days_remaining, 70.0);

        let excluded = CriticalStockEngine.evaluate(&latest, &s, &params(69, 7));
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_zero_velocity_never_critical() {
        let latest = vec![snap("A", 1, 100.0), snap("Z", 1, 0.0)];
        let s = sold(&[]);
        assert!(CriticalStockEngine.evaluate(&latest, &s, &params(10_000, 7)).is_empty());
    }

    #[test]
    fn test_zero_lookback_uses_one_day() {
        let latest = vec![snap("A", 1, 10.0)];
        let s = sold(&[("A", 5)]);
        let items = CriticalStockEngine.evaluate(&latest, &s, &params(14, 0));
        assert_eq!(items[0].avg_units_per_day, 5.0);
        assert_eq!(items[0].days_remaining, 2.0);
    }

    #[test]
    fn test_ranking_and_cap() {
        let latest: Vec<SnapshotFact> = (0..60).map(|i| snap(&format!("S{:02}", i), 1, i as f64)).collect();
        let s: HashMap<String, i64> = (0..60).map(|i| (format!("S{:02}", i), 7)).collect();

        let items = CriticalStockEngine.evaluate(&latest, &s, &params(1_000, 7));
        assert_eq!(items.len(), 50);
        assert!(items.windows(2).all(|w| w[0].days_remaining <= w[1].days_remaining));
        assert_eq!(items[0].sku, "S00");

        let mut wide = params(1_000, 7);
        wide.max_items = 1_000;
        assert_eq!(CriticalStockEngine.evaluate(&latest, &s, &wide).len(), 50);
    }

    #[test]
    fn test_rounding() {
        let latest = vec![snap("A", 1, 10.0)];
        let s = sold(&[("A", 3)]);
        let items = CriticalStockEngine.evaluate(&latest, &s, &params(30, 7));
        // avg = 0.428571..., days = 23.333...
        assert_eq!(items[0].avg_units_per_day, 0.43);
        assert_eq!(items[0].days_remaining, 23.3);
    }
}
