// ==========================================
// Tover - 行校验器
// ==========================================
// 职责: RawRow → 类型化记录 或 VALIDATION_ERROR
// 规则: 同一行的所有问题全部收集，以 "; " 连接；
//       任何一项失败整行进入 errors，不做部分接收
// ==========================================

use crate::domain::import::{RawRow, RowError, Validated, ValidationResult};
use crate::domain::records::{
    InventorySnapshotRecord, OrderLineRecord, OrderRecord, PaymentRecord,
};
use crate::importer::data_cleaner::FieldCleaner;

const DEFAULT_ORDER_STATUS: &str = "created";
const DEFAULT_PAYMENT_STATUS: &str = "pending";

// ==========================================
// RowValidator Trait
// ==========================================
// 实现者: 每种导入类型一个
pub trait RowValidator: Send + Sync {
    type Record: Send;

    /// 校验单行
    ///
    /// # 返回
    /// - Ok(record): 全部字段合法
    /// - Err(issues): 失败字段的错误文案（至少一条）
    fn validate_row(&self, row: &RawRow) -> Result<Self::Record, Vec<String>>;

    /// 校验全部行并分区
    ///
    /// 不变量: valid + errors == rows.len()，两侧各自保持输入顺序
    fn validate_rows(&self, rows: &[RawRow]) -> ValidationResult<Self::Record> {
        let mut result = ValidationResult::new();
        for row in rows {
            match self.validate_row(row) {
                Ok(record) => result.valid.push(Validated {
                    record,
                    raw: row.clone(),
                }),
                Err(issues) => result.errors.push(RowError::validation(row, &issues)),
            }
        }
        result
    }
}

// ===== 通用检查 =====

fn require_text(cleaner: &FieldCleaner, row: &RawRow, field: &str, issues: &mut Vec<String>) -> String {
    let v = cleaner.clean_text(row.get(field));
    if v.is_empty() {
        issues.push(format!("{} is empty", field));
    }
    v
}

fn require_currency(cleaner: &FieldCleaner, row: &RawRow, issues: &mut Vec<String>) -> String {
    match cleaner.normalize_currency(row.get("currency")) {
        Ok(code) => code,
        Err(None) => {
            issues.push("currency is empty".to_string());
            String::new()
        }
        Err(Some(_)) => {
            issues.push("currency must be a 3-letter code".to_string());
            String::new()
        }
    }
}

fn finish<T>(issues: Vec<String>, build: impl FnOnce() -> T) -> Result<T, Vec<String>> {
    if issues.is_empty() {
        Ok(build())
    } else {
        Err(issues)
    }
}

// ==========================================
// 订单
// ==========================================
pub struct OrderRowValidator {
    cleaner: FieldCleaner,
}

impl OrderRowValidator {
    pub fn new() -> Self {
        Self { cleaner: FieldCleaner }
    }
}

impl Default for OrderRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for OrderRowValidator {
    type Record = OrderRecord;

    fn validate_row(&self, row: &RawRow) -> Result<OrderRecord, Vec<String>> {
        let c = &self.cleaner;
        let mut issues = Vec::new();

        let source = require_text(c, row, "source", &mut issues);
        let external_order_id = require_text(c, row, "external_order_id", &mut issues);

        let ordered_at_raw = c.clean_text(row.get("ordered_at"));
        let ordered_at = if ordered_at_raw.is_empty() {
            issues.push("ordered_at is empty".to_string());
            None
        } else {
            let parsed = c.parse_timestamp(&ordered_at_raw);
            if parsed.is_none() {
                issues.push("ordered_at is not a valid date".to_string());
            }
            parsed
        };

        let currency = require_currency(c, row, &mut issues);

        match ordered_at {
            Some(ordered_at) if issues.is_empty() => Ok(OrderRecord {
                source,
                external_order_id,
                ordered_at,
                currency,
                status: c.text_or_default(row.get("status"), DEFAULT_ORDER_STATUS),
            }),
            _ => Err(issues),
        }
    }
}

// ==========================================
// 订单行
// ==========================================
pub struct OrderLineRowValidator {
    cleaner: FieldCleaner,
}

impl OrderLineRowValidator {
    pub fn new() -> Self {
        Self { cleaner: FieldCleaner }
    }
}

impl Default for OrderLineRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for OrderLineRowValidator {
    type Record = OrderLineRecord;

    fn validate_row(&self, row: &RawRow) -> Result<OrderLineRecord, Vec<String>> {
        let c = &self.cleaner;
        let mut issues = Vec::new();

        let external_order_id = require_text(c, row, "external_order_id", &mut issues);
        let source = require_text(c, row, "source", &mut issues);
        let sku = require_text(c, row, "sku", &mut issues);

        let quantity = c.parse_positive_int(row.get("quantity"));
        if quantity.is_none() {
            issues.push("quantity must be a positive integer".to_string());
        }

        let unit_price_gross = c.parse_non_negative(row.get("unit_price_gross"));
        if unit_price_gross.is_none() {
            issues.push("unit_price_gross must be >= 0".to_string());
        }

        let discount_amount = c.parse_non_negative_or_zero(row.get("discount_amount"));
        if discount_amount.is_none() {
            issues.push("discount_amount must be >= 0".to_string());
        }

        let tax_amount = c.parse_non_negative_or_zero(row.get("tax_amount"));
        if tax_amount.is_none() {
            issues.push("tax_amount must be >= 0".to_string());
        }

        finish(issues, || OrderLineRecord {
            external_order_id,
            source,
            sku,
            quantity: quantity.unwrap_or_default(),
            unit_price_gross: unit_price_gross.unwrap_or_default(),
            discount_amount: discount_amount.unwrap_or_default(),
            tax_amount: tax_amount.unwrap_or_default(),
        })
    }
}

// ==========================================
// 库存快照
// ==========================================
pub struct InventoryRowValidator {
    cleaner: FieldCleaner,
}

impl InventoryRowValidator {
    pub fn new() -> Self {
        Self { cleaner: FieldCleaner }
    }
}

impl Default for InventoryRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for InventoryRowValidator {
    type Record = InventorySnapshotRecord;

    fn validate_row(&self, row: &RawRow) -> Result<InventorySnapshotRecord, Vec<String>> {
        let c = &self.cleaner;
        let mut issues = Vec::new();

        let date_raw = c.clean_text(row.get("snapshot_date"));
        let snapshot_date = if date_raw.is_empty() {
            issues.push("snapshot_date is empty".to_string());
            None
        } else {
            let parsed = c.parse_date(&date_raw);
            if parsed.is_none() {
                issues.push("snapshot_date is not a valid date".to_string());
            }
            parsed
        };

        let sku = require_text(c, row, "sku", &mut issues);

        let on_hand_qty = c.parse_non_negative(row.get("on_hand_qty"));
        if on_hand_qty.is_none() {
            issues.push("on_hand_qty must be >= 0".to_string());
        }

        let unit_cost = c.parse_non_negative(row.get("unit_cost"));
        if unit_cost.is_none() {
            issues.push("unit_cost must be >= 0".to_string());
        }

        match (snapshot_date, on_hand_qty, unit_cost) {
            (Some(snapshot_date), Some(on_hand_qty), Some(unit_cost)) if issues.is_empty() => {
                Ok(InventorySnapshotRecord {
                    snapshot_date,
                    sku,
                    on_hand_qty,
                    unit_cost,
                })
            }
            _ => Err(issues),
        }
    }
}

// ==========================================
// 支付
// ==========================================
pub struct PaymentRowValidator {
    cleaner: FieldCleaner,
}

impl PaymentRowValidator {
    pub fn new() -> Self {
        Self { cleaner: FieldCleaner }
    }
}

impl Default for PaymentRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for PaymentRowValidator {
    type Record = PaymentRecord;

    fn validate_row(&self, row: &RawRow) -> Result<PaymentRecord, Vec<String>> {
        let c = &self.cleaner;
        let mut issues = Vec::new();

        let source = require_text(c, row, "source", &mut issues);
        let external_payment_id = require_text(c, row, "external_payment_id", &mut issues);

        // 金额不限符号（退款为负）
        let amount = c.parse_number(row.get("amount"));
        if amount.is_none() {
            issues.push("amount must be a number".to_string());
        }

        let fee_amount = c.parse_number_or(row.get("fee_amount"), 0.0);
        if fee_amount.is_none() {
            issues.push("fee_amount must be a number".to_string());
        }

        let currency = require_currency(c, row, &mut issues);

        // 未结算的支付允许 paid_at 为空
        let paid_at = match c.normalize_null(row.get("paid_at")) {
            None => None,
            Some(raw) => {
                let parsed = c.parse_timestamp(&raw);
                if parsed.is_none() {
                    issues.push("paid_at is not a valid date".to_string());
                }
                parsed
            }
        };

        finish(issues, || PaymentRecord {
            source,
            external_payment_id,
            amount: amount.unwrap_or_default(),
            fee_amount: fee_amount.unwrap_or_default(),
            currency,
            paid_at,
            status: c.text_or_default(row.get("status"), DEFAULT_PAYMENT_STATUS),
        })
    }
}
