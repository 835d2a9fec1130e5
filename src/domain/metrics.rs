// ==========================================
// Tover - 指标领域模型
// ==========================================
// 职责: 临界库存预测输出 / KPI 汇总输出
// 对外字段采用 camelCase
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CriticalStockItem - 临界库存项
// ==========================================
// days_remaining = on_hand_qty / avg_units_per_day（avg > 0 时）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalStockItem {
    pub sku: String,
    pub on_hand_qty: f64,
    pub avg_units_per_day: f64, // 2 位小数
    pub days_remaining: f64,    // 1 位小数
}

/// 临界库存查询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastParams {
    pub n_days: i64,        // 预测窗口（天）
    pub lookback_days: i64, // 销量回看窗口（天）
    pub max_items: usize,   // 返回上限
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            n_days: 14,
            lookback_days: 7,
            max_items: 50,
        }
    }
}

// ==========================================
// KPI 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub gmv_gross: f64,
    pub units_sold: i64,
    pub orders_count: usize,
    pub stock_value_cost: Option<f64>,
    pub inventory_snapshot_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub workspace_id: String,
    pub range: DateRange,
    pub kpis: SalesKpis,
    pub meta: SummaryMeta,
}
