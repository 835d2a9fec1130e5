// ==========================================
// Tover - 订单行父订单解析
// ==========================================
// 职责: 去重父订单键 / 按查找结果拆分为可落库行与 MISSING_ORDER
// 约束: 所有父订单查找完成后才允许插入订单行
// ==========================================

use crate::domain::import::{RowError, Validated};
use crate::domain::records::{OrderKey, OrderLineRecord};
use std::collections::{HashMap, HashSet};

/// 已解析出父订单 id 的订单行
pub type ResolvedLine = Validated<(String, OrderLineRecord)>;

/// 拆分结果
#[derive(Debug, Default)]
pub struct LineResolution {
    pub resolved: Vec<ResolvedLine>,
    pub missing: Vec<RowError>,
}

pub struct OrderLineResolver;

impl OrderLineResolver {
    /// 订单行引用的父订单键（去重，保持首次出现顺序）
    pub fn distinct_keys(&self, lines: &[Validated<OrderLineRecord>]) -> Vec<OrderKey> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for line in lines {
            let key = line.record.order_key();
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }

        keys
    }

    /// 按查找结果拆分
    ///
    /// # 参数
    /// - lines: 校验通过的订单行
    /// - found: 父订单键 → order_id
    ///
    /// # 返回
    /// - resolved: 找到父订单的行（保持输入顺序）
    /// - missing: 找不到父订单的行，错误保留原行号与原始行
    pub fn split(
        &self,
        lines: Vec<Validated<OrderLineRecord>>,
        found: &HashMap<OrderKey, String>,
    ) -> LineResolution {
        let mut out = LineResolution::default();

        for line in lines {
            match found.get(&line.record.order_key()) {
                Some(order_id) => out.resolved.push(Validated {
                    record: (order_id.clone(), line.record),
                    raw: line.raw,
                }),
                None => out.missing.push(RowError::missing_order(
                    &line.raw,
                    &line.record.source,
                    &line.record.external_order_id,
                )),
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RawRow;
    use crate::domain::types::RowErrorCode;

    fn line(row: usize, source: &str, ext: &str) -> Validated<OrderLineRecord> {
        Validated {
            record: OrderLineRecord {
                external_order_id: ext.to_string(),
                source: source.to_string(),
                sku: "SKU".to_string(),
                quantity: 1,
                unit_price_gross: 10.0,
                discount_amount: 0.0,
                tax_amount: 0.0,
            },
            raw: RawRow::new(row, vec![("external_order_id".to_string(), ext.to_string())]),
        }
    }

    #[test]
    fn test_distinct_keys_dedupes_in_order() {
        let lines = vec![
            line(2, "ozon", "A"),
            line(3, "ozon", "B"),
            line(4, "ozon", "A"),
            line(5, "wb", "A"),
        ];
        let keys = OrderLineResolver.distinct_keys(&lines);
        let flat: Vec<(&str, &str)> = keys
            .iter()
            .map(|k| (k.source.as_str(), k.external_order_id.as_str()))
            .collect();
        assert_eq!(flat, vec![("ozon", "A"), ("ozon", "B"), ("wb", "A")]);
    }

    #[test]
    fn test_split_marks_missing_orders() {
        let lines = vec![line(2, "ozon", "A"), line(3, "ozon", "NOPE"), line(4, "ozon", "A")];
        let mut found = HashMap::new();
        found.insert(
            OrderKey {
                source: "ozon".to_string(),
                external_order_id: "A".to_string(),
            },
            "order-1".to_string(),
        );

        let res = OrderLineResolver.split(lines, &found);
        assert_eq!(res.resolved.len(), 2);
        assert_eq!(res.resolved[1].raw.row_number, 4);
        assert_eq!(res.resolved[0].record.0, "order-1");

        assert_eq!(res.missing.len(), 1);
        let err = &res.missing[0];
        assert_eq!(err.error_code, RowErrorCode::MissingOrder);
        assert_eq!(err.row_number, 3);
        assert_eq!(err.error_detail, "Order not found: ozon / NOPE");
    }
}
