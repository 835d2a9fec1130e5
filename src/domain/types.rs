// ==========================================
// Tover - 领域类型定义
// ==========================================
// 职责: 导入类型 / 导入状态 / 行错误码
// 序列化格式与持久化层保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 导入类型 (Import Type)
// ==========================================
// 封闭集合: 每种类型对应一种记录形态与一组必填列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportType {
    #[serde(rename = "orders_csv")]
    Orders,
    #[serde(rename = "order_lines_csv")]
    OrderLines,
    #[serde(rename = "inventory_csv")]
    Inventory,
    #[serde(rename = "payments_csv")]
    Payments,
}

impl ImportType {
    /// 全部导入类型（顺序即对外展示顺序）
    pub const ALL: [ImportType; 4] = [
        ImportType::Orders,
        ImportType::OrderLines,
        ImportType::Inventory,
        ImportType::Payments,
    ];

    /// 外部标签（上传接口使用）
    pub fn tag(&self) -> &'static str {
        match self {
            ImportType::Orders => "orders_csv",
            ImportType::OrderLines => "order_lines_csv",
            ImportType::Inventory => "inventory_csv",
            ImportType::Payments => "payments_csv",
        }
    }

    /// 该类型的必填列（小写）
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            ImportType::Orders => &["source", "external_order_id", "ordered_at", "currency"],
            ImportType::OrderLines => &[
                "external_order_id",
                "source",
                "sku",
                "quantity",
                "unit_price_gross",
            ],
            ImportType::Inventory => &["snapshot_date", "sku", "on_hand_qty", "unit_cost"],
            ImportType::Payments => &["source", "external_payment_id", "amount", "currency"],
        }
    }

    /// 所有合法标签，逗号分隔
    pub fn valid_tags() -> String {
        Self::ALL
            .iter()
            .map(|t| t.tag())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for ImportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "orders_csv" => Ok(ImportType::Orders),
            "order_lines_csv" => Ok(ImportType::OrderLines),
            "inventory_csv" => Ok(ImportType::Inventory),
            "payments_csv" => Ok(ImportType::Payments),
            other => Err(format!(
                "Invalid import_type '{}'. Must be one of: {}",
                other,
                Self::valid_tags()
            )),
        }
    }
}

// ==========================================
// 导入状态 (Import Status)
// ==========================================
// processing → completed | failed，终态不可再打开
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportStatus::Processing)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Processing => write!(f, "processing"),
            ImportStatus::Completed => write!(f, "completed"),
            ImportStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(ImportStatus::Processing),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            other => Err(format!("未知导入状态: {}", other)),
        }
    }
}

// ==========================================
// 行错误码 (Row Error Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorCode {
    ValidationError, // 字段校验失败
    MissingOrder,    // 订单行找不到父订单
    DbError,         // 批次级落库失败（row_number = 0）
}

impl fmt::Display for RowErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            RowErrorCode::MissingOrder => write!(f, "MISSING_ORDER"),
            RowErrorCode::DbError => write!(f, "DB_ERROR"),
        }
    }
}

impl FromStr for RowErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALIDATION_ERROR" => Ok(RowErrorCode::ValidationError),
            "MISSING_ORDER" => Ok(RowErrorCode::MissingOrder),
            "DB_ERROR" => Ok(RowErrorCode::DbError),
            other => Err(format!("未知错误码: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_type_tag_roundtrip() {
        for t in ImportType::ALL {
            assert_eq!(t.tag().parse::<ImportType>().unwrap(), t);
        }
    }

    #[test]
    fn test_import_type_unknown_tag_lists_valid_tags() {
        let err = "xlsx".parse::<ImportType>().unwrap_err();
        assert!(err.contains("orders_csv, order_lines_csv, inventory_csv, payments_csv"));
    }

    #[test]
    fn test_row_error_code_serde() {
        let json = serde_json::to_string(&RowErrorCode::MissingOrder).unwrap();
        assert_eq!(json, "\"MISSING_ORDER\"");
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ImportStatus::Processing.is_terminal());
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
    }
}
