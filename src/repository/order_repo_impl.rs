// ==========================================
// Tover - 订单浏览 Repository 实现
// ==========================================
// 职责: 在 SalesRepositoryImpl 上实现 OrderRepository（使用 rusqlite）
// ==========================================

use crate::domain::records::{StoredOrder, StoredOrderLine};
use crate::repository::error::RepositoryResult;
use crate::repository::import_repo_impl::{parse_db_timestamp, to_db_timestamp};
use crate::repository::order_repo::OrderRepository;
use crate::repository::sales_repo_impl::SalesRepositoryImpl;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

const ORDER_COLUMNS: &str = "id, source, external_order_id, ordered_at, currency, status";

fn map_order_row(row: &Row) -> rusqlite::Result<StoredOrder> {
    let ordered_at: String = row.get(3)?;
    Ok(StoredOrder {
        id: row.get(0)?,
        source: row.get(1)?,
        external_order_id: row.get(2)?,
        ordered_at: parse_db_timestamp(&ordered_at, 3)?,
        currency: row.get(4)?,
        status: row.get(5)?,
    })
}

#[async_trait]
impl OrderRepository for SalesRepositoryImpl {
    async fn list_orders(
        &self,
        workspace_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<StoredOrder>, usize)> {
        let from = to_db_timestamp(&from);
        let to = to_db_timestamp(&to);
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE workspace_id = ?1 AND ordered_at >= ?2 AND ordered_at < ?3",
            params![workspace_id, from, to],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM orders \
             WHERE workspace_id = ?1 AND ordered_at >= ?2 AND ordered_at < ?3 \
             ORDER BY ordered_at DESC, rowid DESC LIMIT ?4 OFFSET ?5",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![workspace_id, from, to, limit as i64, offset as i64],
                map_order_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total as usize))
    }

    async fn get_order(&self, workspace_id: &str, order_id: &str) -> RepositoryResult<Option<StoredOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM orders WHERE workspace_id = ?1 AND id = ?2",
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(&sql, params![workspace_id, order_id], map_order_row)
            .optional()?;
        Ok(order)
    }

    async fn list_order_lines(&self, order_id: &str) -> RepositoryResult<Vec<StoredOrderLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_id, sku, quantity, unit_price_gross, discount_amount, tax_amount
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY sku ASC, rowid ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![order_id], |row| {
                Ok(StoredOrderLine {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    sku: row.get(2)?,
                    quantity: row.get(3)?,
                    unit_price_gross: row.get(4)?,
                    discount_amount: row.get(5)?,
                    tax_amount: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
