// ==========================================
// Tover - 业务记录模型
// ==========================================
// 职责: 四类导入记录的类型化形态 + 预测/KPI 读取用的事实行
// 自然键: 见各结构体注释，落库时按自然键 upsert
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// OrderRecord - 订单
// ==========================================
// 自然键: (workspace_id, source, external_order_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub source: String,
    pub external_order_id: String,
    pub ordered_at: DateTime<Utc>,
    pub currency: String, // 3 位大写字母
    pub status: String,   // 缺省 "created"
}

// ==========================================
// OrderLineRecord - 订单行
// ==========================================
// 无独立自然键，通过 (source, external_order_id) 引用订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub external_order_id: String,
    pub source: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_gross: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
}

impl OrderLineRecord {
    /// 父订单查找键
    pub fn order_key(&self) -> OrderKey {
        OrderKey {
            source: self.source.clone(),
            external_order_id: self.external_order_id.clone(),
        }
    }
}

/// 订单业务键（工作区内唯一）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderKey {
    pub source: String,
    pub external_order_id: String,
}

// ==========================================
// InventorySnapshotRecord - 库存快照
// ==========================================
// 自然键: (workspace_id, snapshot_date, sku)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshotRecord {
    pub snapshot_date: NaiveDate,
    pub sku: String,
    pub on_hand_qty: f64,
    pub unit_cost: f64,
}

// ==========================================
// PaymentRecord - 支付
// ==========================================
// 自然键: (workspace_id, source, external_payment_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub source: String,
    pub external_payment_id: String,
    pub amount: f64,     // 可为负（退款）
    pub fee_amount: f64, // 缺省 0
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>, // 未结算时为空
    pub status: String,                 // 缺省 "pending"
}

// ==========================================
// 读取侧事实行
// ==========================================

/// 库存快照（预测输入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFact {
    pub sku: String,
    pub snapshot_date: NaiveDate,
    pub on_hand_qty: f64,
    pub unit_cost: f64,
}

/// 订单行（销量/GMV 聚合输入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineFact {
    pub order_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_gross: f64,
}

/// 已落库订单的精简视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: String,
    pub ordered_at: DateTime<Utc>,
    pub status: String,
}

/// 已落库订单（订单列表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub id: String,
    pub source: String,
    pub external_order_id: String,
    pub ordered_at: DateTime<Utc>,
    pub currency: String,
    pub status: String,
}

/// 已落库订单行（订单明细）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrderLine {
    pub id: String,
    pub order_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_gross: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
}
