// ==========================================
// Tover - 销售数据 Repository 实现
// ==========================================
// 职责: 实现 SalesRepository（使用 rusqlite）
// 写入: INSERT ... ON CONFLICT(自然键) DO UPDATE，单调用单事务
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::records::{
    InventorySnapshotRecord, OrderKey, OrderLineFact, OrderLineRecord, OrderRecord, OrderRef,
    PaymentRecord, SnapshotFact,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo_impl::{parse_db_timestamp, to_db_timestamp};
use crate::repository::sales_repo::SalesRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SalesRepositoryImpl
// ==========================================
pub struct SalesRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SalesRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(crate) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_snapshot_row(row: &Row) -> rusqlite::Result<SnapshotFact> {
        Ok(SnapshotFact {
            sku: row.get(0)?,
            snapshot_date: row.get(1)?,
            on_hand_qty: row.get(2)?,
            unit_cost: row.get(3)?,
        })
    }
}

#[async_trait]
impl SalesRepository for SalesRepositoryImpl {
    async fn upsert_orders(&self, workspace_id: &str, orders: &[OrderRecord]) -> RepositoryResult<usize> {
        let now = to_db_timestamp(&Utc::now());
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO orders (
                    id, workspace_id, source, external_order_id, ordered_at,
                    currency, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                ON CONFLICT(workspace_id, source, external_order_id) DO UPDATE SET
                    ordered_at = excluded.ordered_at,
                    currency = excluded.currency,
                    status = excluded.status,
                    updated_at = excluded.updated_at
                "#,
            )?;

            for order in orders {
                count += stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    workspace_id,
                    order.source,
                    order.external_order_id,
                    to_db_timestamp(&order.ordered_at),
                    order.currency,
                    order.status,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        debug!(workspace_id = workspace_id, count = count, "订单 upsert 完成");
        Ok(count)
    }

    async fn find_order_ids(
        &self,
        workspace_id: &str,
        keys: &[OrderKey],
    ) -> RepositoryResult<HashMap<OrderKey, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM orders WHERE workspace_id = ?1 AND source = ?2 AND external_order_id = ?3",
        )?;

        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let id: Option<String> = stmt
                .query_row(
                    params![workspace_id, key.source, key.external_order_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(id) = id {
                found.insert(key.clone(), id);
            }
        }

        Ok(found)
    }

    async fn insert_order_lines(&self, lines: &[(String, OrderLineRecord)]) -> RepositoryResult<usize> {
        let now = to_db_timestamp(&Utc::now());
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO order_lines (
                    id, order_id, sku, quantity, unit_price_gross,
                    discount_amount, tax_amount, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for (order_id, line) in lines {
                count += stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    order_id,
                    line.sku,
                    line.quantity,
                    line.unit_price_gross,
                    line.discount_amount,
                    line.tax_amount,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    async fn upsert_inventory_snapshots(
        &self,
        workspace_id: &str,
        snapshots: &[InventorySnapshotRecord],
    ) -> RepositoryResult<usize> {
        let now = to_db_timestamp(&Utc::now());
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO inventory_snapshots (
                    id, workspace_id, snapshot_date, sku, on_hand_qty, unit_cost, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(workspace_id, snapshot_date, sku) DO UPDATE SET
                    on_hand_qty = excluded.on_hand_qty,
                    unit_cost = excluded.unit_cost
                "#,
            )?;

            for snap in snapshots {
                count += stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    workspace_id,
                    snap.snapshot_date,
                    snap.sku,
                    snap.on_hand_qty,
                    snap.unit_cost,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    async fn upsert_payments(&self, workspace_id: &str, payments: &[PaymentRecord]) -> RepositoryResult<usize> {
        let now = to_db_timestamp(&Utc::now());
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO payments (
                    id, workspace_id, source, external_payment_id, amount,
                    fee_amount, currency, paid_at, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(workspace_id, source, external_payment_id) DO UPDATE SET
                    amount = excluded.amount,
                    fee_amount = excluded.fee_amount,
                    currency = excluded.currency,
                    paid_at = excluded.paid_at,
                    status = excluded.status
                "#,
            )?;

            for p in payments {
                count += stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    workspace_id,
                    p.source,
                    p.external_payment_id,
                    p.amount,
                    p.fee_amount,
                    p.currency,
                    p.paid_at.as_ref().map(to_db_timestamp),
                    p.status,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    async fn fetch_snapshots_by_workspace(&self, workspace_id: &str) -> RepositoryResult<Vec<SnapshotFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sku, snapshot_date, on_hand_qty, unit_cost
            FROM inventory_snapshots
            WHERE workspace_id = ?1
            ORDER BY snapshot_date DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![workspace_id], Self::map_snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn fetch_orders_in_range(
        &self,
        workspace_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude_status: &str,
    ) -> RepositoryResult<Vec<OrderRef>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, ordered_at, status
            FROM orders
            WHERE workspace_id = ?1
              AND ordered_at >= ?2
              AND ordered_at < ?3
              AND status <> ?4
            ORDER BY ordered_at ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    workspace_id,
                    to_db_timestamp(&from),
                    to_db_timestamp(&to),
                    exclude_status
                ],
                |row| {
                    let ordered_at: String = row.get(1)?;
                    Ok(OrderRef {
                        id: row.get(0)?,
                        ordered_at: parse_db_timestamp(&ordered_at, 1)?,
                        status: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn fetch_order_lines_by_order_ids(&self, order_ids: &[String]) -> RepositoryResult<Vec<OrderLineFact>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; order_ids.len()].join(", ");
        let sql = format!(
            "SELECT order_id, sku, quantity, unit_price_gross FROM order_lines WHERE order_id IN ({})",
            placeholders
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(order_ids.iter()), |row| {
                Ok(OrderLineFact {
                    order_id: row.get(0)?,
                    sku: row.get(1)?,
                    quantity: row.get(2)?,
                    unit_price_gross: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn latest_snapshot_date(&self, workspace_id: &str) -> RepositoryResult<Option<NaiveDate>> {
        let conn = self.get_conn()?;
        let date: Option<NaiveDate> = conn.query_row(
            "SELECT MAX(snapshot_date) FROM inventory_snapshots WHERE workspace_id = ?1",
            params![workspace_id],
            |row| row.get(0),
        )?;
        Ok(date)
    }

    async fn fetch_snapshots_on_date(
        &self,
        workspace_id: &str,
        snapshot_date: NaiveDate,
    ) -> RepositoryResult<Vec<SnapshotFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sku, snapshot_date, on_hand_qty, unit_cost
            FROM inventory_snapshots
            WHERE workspace_id = ?1 AND snapshot_date = ?2
            ORDER BY sku
            "#,
        )?;

        let rows = stmt
            .query_map(params![workspace_id, snapshot_date], Self::map_snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo() -> SalesRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        SalesRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn order(ext: &str, status: &str) -> OrderRecord {
        OrderRecord {
            source: "ozon".to_string(),
            external_order_id: ext.to_string(),
            ordered_at: Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap(),
            currency: "EUR".to_string(),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_order_upsert_updates_in_place() {
        let repo = repo();
        repo.upsert_orders("ws", &[order("A1", "created")]).await.unwrap();
        repo.upsert_orders("ws", &[order("A1", "shipped")]).await.unwrap();

        let key = OrderKey {
            source: "ozon".to_string(),
            external_order_id: "A1".to_string(),
        };
        let ids = repo.find_order_ids("ws", &[key.clone()]).await.unwrap();
        assert_eq!(ids.len(), 1);

        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let orders = repo.fetch_orders_in_range("ws", from, to, "cancelled").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, "shipped");
        assert_eq!(orders[0].id, ids[&key]);
    }

    #[tokio::test]
    async fn test_find_order_ids_is_workspace_scoped() {
        let repo = repo();
        repo.upsert_orders("ws-a", &[order("A1", "created")]).await.unwrap();

        let key = OrderKey {
            source: "ozon".to_string(),
            external_order_id: "A1".to_string(),
        };
        assert!(repo.find_order_ids("ws-b", &[key]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_line_with_unknown_order_violates_fk() {
        let repo = repo();
        let line = OrderLineRecord {
            external_order_id: "X".to_string(),
            source: "ozon".to_string(),
            sku: "S".to_string(),
            quantity: 1,
            unit_price_gross: 1.0,
            discount_amount: 0.0,
            tax_amount: 0.0,
        };
        let err = repo
            .insert_order_lines(&[("missing".to_string(), line)])
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), "constraint_violation");
    }

    #[tokio::test]
    async fn test_snapshots_ordered_desc_and_latest_date() {
        let repo = repo();
        let d1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let snaps = vec![
            InventorySnapshotRecord { snapshot_date: d1, sku: "A".into(), on_hand_qty: 5.0, unit_cost: 1.0 },
            InventorySnapshotRecord { snapshot_date: d2, sku: "A".into(), on_hand_qty: 3.0, unit_cost: 1.0 },
        ];
        repo.upsert_inventory_snapshots("ws", &snaps).await.unwrap();

        let all = repo.fetch_snapshots_by_workspace("ws").await.unwrap();
        assert_eq!(all[0].snapshot_date, d2);
        assert_eq!(all[1].snapshot_date, d1);

        assert_eq!(repo.latest_snapshot_date("ws").await.unwrap(), Some(d2));
        assert_eq!(repo.latest_snapshot_date("other").await.unwrap(), None);
        assert_eq!(repo.fetch_snapshots_on_date("ws", d2).await.unwrap().len(), 1);
    }
}
