// ==========================================
// Tover - 导入领域模型
// ==========================================
// 职责: 原始行 / 行错误 / 校验结果 / 导入记录 / 导入汇总
// 生命周期: RawRow、RowError 生成后不再修改
// ==========================================

use crate::domain::types::{ImportStatus, ImportType, RowErrorCode};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ==========================================
// RawRow - 解析后的原始行
// ==========================================
// 字段按文件列顺序保存；列名已 trim + 小写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,          // 文件行号（表头为第 1 行）
    fields: Vec<(String, String)>,  // (列名, 原始值)
}

impl RawRow {
    pub fn new(row_number: usize, fields: Vec<(String, String)>) -> Self {
        Self { row_number, fields }
    }

    /// 空行（用于批次级错误的 raw_row）
    pub fn empty() -> Self {
        Self {
            row_number: 0,
            fields: Vec::new(),
        }
    }

    /// 按列名取原始值（未 trim）
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,     // 0 表示批次级错误
    pub error_code: RowErrorCode,
    pub error_detail: String,  // 多个问题以 "; " 连接
    pub raw_row: RawRow,
}

impl RowError {
    /// 字段校验失败
    pub fn validation(raw: &RawRow, issues: &[String]) -> Self {
        Self {
            row_number: raw.row_number,
            error_code: RowErrorCode::ValidationError,
            error_detail: issues.join("; "),
            raw_row: raw.clone(),
        }
    }

    /// 订单行的父订单不存在
    pub fn missing_order(raw: &RawRow, source: &str, external_order_id: &str) -> Self {
        Self {
            row_number: raw.row_number,
            error_code: RowErrorCode::MissingOrder,
            error_detail: format!("Order not found: {} / {}", source, external_order_id),
            raw_row: raw.clone(),
        }
    }

    /// 批次级落库失败（哨兵行号 0，空 raw_row）
    pub fn db_error(detail: impl Into<String>) -> Self {
        Self {
            row_number: 0,
            error_code: RowErrorCode::DbError,
            error_detail: detail.into(),
            raw_row: RawRow::empty(),
        }
    }
}

// ==========================================
// Validated<T> - 带来源行的合法记录
// ==========================================
// 保留 raw 以便后续（缺失父订单）转为 RowError
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub record: T,
    pub raw: RawRow,
}

// ==========================================
// ValidationResult - 校验分区
// ==========================================
// 不变量: valid.len() + errors.len() == 输入行数
#[derive(Debug, Clone)]
pub struct ValidationResult<T> {
    pub valid: Vec<Validated<T>>,
    pub errors: Vec<RowError>,
}

impl<T> ValidationResult<T> {
    pub fn new() -> Self {
        Self {
            valid: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.valid.len() + self.errors.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.valid.iter().map(|v| &v.record)
    }
}

impl<T> Default for ValidationResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
// Counts: 正常处理完成；Rejected: 表头校验失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportSummary {
    Counts {
        #[serde(rename = "totalRows")]
        total_rows: usize,
        inserted: usize,
        errors: usize,
    },
    Rejected {
        error: String,
    },
}

impl ImportSummary {
    pub fn zero() -> Self {
        ImportSummary::Counts {
            total_rows: 0,
            inserted: 0,
            errors: 0,
        }
    }
}

// ==========================================
// Import - 一次上传
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    pub id: String,
    pub workspace_id: String,
    pub file_name: String,
    pub import_type: ImportType,
    pub status: ImportStatus,
    pub summary: Option<ImportSummary>, // processing 期间为空
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ==========================================
// ImportOutcome - 导入入口返回值
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub import_id: String,
    pub status: ImportStatus,
    pub summary: ImportSummary,
    #[serde(skip)]
    pub errors: Vec<RowError>,
}

// ==========================================
// ImportErrorEntry - 已落库的错误日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportErrorEntry {
    pub id: i64,
    pub import_id: String,
    pub row_number: usize,
    pub error_code: RowErrorCode,
    pub error_detail: String,
    pub raw_row: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// Page - 分页结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RawRow {
        RawRow::new(
            2,
            vec![
                ("source".to_string(), "ozon".to_string()),
                ("currency".to_string(), "rub".to_string()),
            ],
        )
    }

    #[test]
    fn test_raw_row_keeps_column_order_in_json() {
        let json = serde_json::to_string(&row()).unwrap();
        assert_eq!(json, r#"{"source":"ozon","currency":"rub"}"#);
    }

    #[test]
    fn test_db_error_uses_sentinel_row() {
        let err = RowError::db_error("boom");
        assert_eq!(err.row_number, 0);
        assert_eq!(serde_json::to_string(&err.raw_row).unwrap(), "{}");
        assert_eq!(err.error_code, RowErrorCode::DbError);
    }

    #[test]
    fn test_validation_joins_issues() {
        let err = RowError::validation(&row(), &["a is empty".into(), "b is empty".into()]);
        assert_eq!(err.error_detail, "a is empty; b is empty");
        assert_eq!(err.row_number, 2);
    }

    #[test]
    fn test_summary_serialization_shapes() {
        let counts = ImportSummary::Counts {
            total_rows: 3,
            inserted: 2,
            errors: 1,
        };
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"totalRows":3,"inserted":2,"errors":1}"#
        );

        let rejected: ImportSummary =
            serde_json::from_str(r#"{"error":"Missing required columns: sku"}"#).unwrap();
        assert_eq!(
            rejected,
            ImportSummary::Rejected {
                error: "Missing required columns: sku".to_string()
            }
        );
    }
}
