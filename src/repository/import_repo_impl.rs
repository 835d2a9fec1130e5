// ==========================================
// Tover - 导入记录 Repository 实现
// ==========================================
// 职责: 实现 imports / import_errors 数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::{Import, ImportErrorEntry, ImportSummary, RowError};
use crate::domain::types::{ImportStatus, ImportType, RowErrorCode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo::ImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_db_timestamp(raw: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_enum<T: std::str::FromStr<Err = String>>(raw: &str, col: usize) -> rusqlite::Result<T> {
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

// ==========================================
// ImportRepositoryImpl
// ==========================================
pub struct ImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportRepositoryImpl {
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

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_import_row(row: &Row) -> rusqlite::Result<Import> {
        let import_type: String = row.get(3)?;
        let status: String = row.get(4)?;
        let summary_json: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;
        let completed_at: Option<String> = row.get(7)?;

        let summary = match summary_json {
            Some(raw) => Some(serde_json::from_str::<ImportSummary>(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
            })?),
            None => None,
        };

        Ok(Import {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            file_name: row.get(2)?,
            import_type: parse_enum::<ImportType>(&import_type, 3)?,
            status: parse_enum::<ImportStatus>(&status, 4)?,
            summary,
            created_at: parse_db_timestamp(&created_at, 6)?,
            completed_at: completed_at
                .as_deref()
                .map(|v| parse_db_timestamp(v, 7))
                .transpose()?,
        })
    }

    fn map_error_row(row: &Row) -> rusqlite::Result<ImportErrorEntry> {
        let row_number: i64 = row.get(2)?;
        let error_code: String = row.get(3)?;
        let raw_row_json: String = row.get(5)?;
        let created_at: String = row.get(6)?;

        Ok(ImportErrorEntry {
            id: row.get(0)?,
            import_id: row.get(1)?,
            row_number: row_number.max(0) as usize,
            error_code: parse_enum::<RowErrorCode>(&error_code, 3)?,
            error_detail: row.get(4)?,
            raw_row: serde_json::from_str(&raw_row_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
            })?,
            created_at: parse_db_timestamp(&created_at, 6)?,
        })
    }
}

const IMPORT_COLUMNS: &str =
    "id, workspace_id, file_name, import_type, status, summary_json, created_at, completed_at";

#[async_trait]
impl ImportRepository for ImportRepositoryImpl {
    async fn create_import(&self, import: &Import) -> RepositoryResult<()> {
        let summary_json = import
            .summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO imports (
                id, workspace_id, file_name, import_type, status,
                summary_json, created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                import.id,
                import.workspace_id,
                import.file_name,
                import.import_type.tag(),
                import.status.to_string(),
                summary_json,
                to_db_timestamp(&import.created_at),
                import.completed_at.as_ref().map(to_db_timestamp),
            ],
        )?;
        Ok(())
    }

    async fn complete_import(
        &self,
        import_id: &str,
        status: ImportStatus,
        summary: &ImportSummary,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let summary_json = serde_json::to_string(summary)?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE imports SET status = ?1, summary_json = ?2, completed_at = ?3 WHERE id = ?4",
            params![
                status.to_string(),
                summary_json,
                to_db_timestamp(&completed_at),
                import_id
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Import".to_string(),
                id: import_id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_error_log(&self, import_id: &str, errors: &[RowError]) -> RepositoryResult<usize> {
        if errors.is_empty() {
            return Ok(0);
        }

        let now = to_db_timestamp(&Utc::now());
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO import_errors (
                    import_id, row_number, error_code, error_detail, raw_row_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for err in errors {
                let raw_row_json = serde_json::to_string(&err.raw_row)?;
                stmt.execute(params![
                    import_id,
                    err.row_number as i64,
                    err.error_code.to_string(),
                    err.error_detail,
                    raw_row_json,
                    now,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    async fn get_import(&self, import_id: &str) -> RepositoryResult<Option<Import>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM imports WHERE id = ?1", IMPORT_COLUMNS);
        let import = conn
            .query_row(&sql, params![import_id], Self::map_import_row)
            .optional()?;
        Ok(import)
    }

    async fn list_imports(
        &self,
        workspace_id: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<Import>, usize)> {
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM imports WHERE workspace_id = ?1",
            params![workspace_id],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM imports WHERE workspace_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
            IMPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![workspace_id, limit as i64, offset as i64],
                Self::map_import_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total as usize))
    }

    async fn list_import_errors(
        &self,
        import_id: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<ImportErrorEntry>, usize)> {
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM import_errors WHERE import_id = ?1",
            params![import_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, import_id, row_number, error_code, error_detail, raw_row_json, created_at
            FROM import_errors
            WHERE import_id = ?1
            ORDER BY row_number ASC, id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let items = stmt
            .query_map(
                params![import_id, limit as i64, offset as i64],
                Self::map_error_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RawRow;

    fn repo() -> (ImportRepositoryImpl, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (ImportRepositoryImpl::from_connection(conn.clone()), conn)
    }

    fn processing(id: &str) -> Import {
        Import {
            id: id.to_string(),
            workspace_id: "ws".to_string(),
            file_name: "orders.csv".to_string(),
            import_type: ImportType::Orders,
            status: ImportStatus::Processing,
            summary: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_error_log_keeps_raw_row() {
        let (repo, _conn) = repo();
        repo.create_import(&processing("imp-1")).await.unwrap();

        let raw = RawRow::new(3, vec![("sku".to_string(), " A ".to_string())]);
        let errors = vec![RowError::validation(&raw, &["quantity is empty".to_string()])];
        assert_eq!(repo.insert_error_log("imp-1", &errors).await.unwrap(), 1);

        let (items, total) = repo.list_import_errors("imp-1", 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].row_number, 3);
        assert_eq!(items[0].raw_row, serde_json::json!({"sku": " A "}));
    }

    #[tokio::test]
    async fn test_corrupt_raw_row_json_is_reported() {
        let (repo, conn) = repo();
        repo.create_import(&processing("imp-2")).await.unwrap();
        conn.lock()
            .unwrap()
            .execute(
                "INSERT INTO import_errors (import_id, row_number, error_code, error_detail, raw_row_json, created_at)
                 VALUES ('imp-2', 2, 'VALIDATION_ERROR', 'x', '{not json', '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        assert!(repo.list_import_errors("imp-2", 10, 0).await.is_err());
    }
}
