// ==========================================
// Tover - 表头校验
// ==========================================
// 职责: 必需列检查（快速失败闸门）
// ==========================================

use crate::domain::types::ImportType;

/// 校验表头是否包含该导入类型的全部必需列
///
/// # 参数
/// - import_type: 导入类型
/// - headers: 已 trim + 小写的表头
///
/// # 返回
/// - None: 表头完整
/// - Some(msg): 列出所有缺失列（按必需列顺序）
pub fn validate_headers(import_type: ImportType, headers: &[String]) -> Option<String> {
    let missing: Vec<&str> = import_type
        .required_columns()
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!("Missing required columns: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_complete_headers_pass() {
        let h = headers(&["source", "external_order_id", "ordered_at", "currency", "status"]);
        assert_eq!(validate_headers(ImportType::Orders, &h), None);
    }

    #[test]
    fn test_all_missing_columns_are_named() {
        let h = headers(&["source", "currency"]);
        assert_eq!(
            validate_headers(ImportType::Orders, &h).as_deref(),
            Some("Missing required columns: external_order_id, ordered_at")
        );
    }

    #[test]
    fn test_each_kind_has_gate() {
        for kind in ImportType::ALL {
            let msg = validate_headers(kind, &[]).unwrap();
            for col in kind.required_columns() {
                assert!(msg.contains(col), "{} missing from '{}'", col, msg);
            }
        }
    }
}
