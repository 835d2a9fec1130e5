// ==========================================
// Tover - 订单浏览领域模型
// ==========================================
// 职责: 订单列表项（含订单 GMV/件数）/ 订单明细行
// 对外字段采用 camelCase
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// OrderListItem - 订单列表项
// ==========================================
// order_gmv = Σ quantity × unit_price_gross（2 位小数）；无订单行时为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListItem {
    pub id: String,
    pub source: String,
    pub external_order_id: String,
    pub ordered_at: DateTime<Utc>,
    pub currency: String,
    pub status: String,
    pub order_gmv: f64,
    pub order_units: i64,
}

/// 订单明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_gross: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub line_gmv: f64, // quantity × unit_price_gross，2 位小数
}

/// 单个订单的全部订单行（按 SKU 升序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLines {
    pub order_id: String,
    pub items: Vec<OrderLineItem>,
}
