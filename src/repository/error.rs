// ==========================================
// Tover - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: SQLite 错误统一经 From<rusqlite::Error> 分类
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库忙或已锁定: {0}")]
    DatabaseBusy(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("约束违反: {0}")]
    ConstraintViolation(String),

    // ===== 数据格式错误 =====
    #[error("序列化失败: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 批次落库失败时写入 DB_ERROR 的失败类别
    ///
    /// - constraint_violation: 唯一/外键/CHECK 约束
    /// - timeout: busy_timeout 到期仍未拿到锁
    /// - unavailable: 连接锁中毒、连接不可用
    /// - query_failed: 其余
    pub fn failure_kind(&self) -> &'static str {
        match self {
            RepositoryError::UniqueConstraintViolation(_)
            | RepositoryError::ForeignKeyViolation(_)
            | RepositoryError::ConstraintViolation(_) => "constraint_violation",
            RepositoryError::DatabaseBusy(_) => "timeout",
            RepositoryError::LockError(_) => "unavailable",
            _ => "query_failed",
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg) => {
                let msg = msg.clone().unwrap_or_else(|| err.to_string());
                match e.code {
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseBusy(msg)
                    }
                    rusqlite::ErrorCode::CannotOpen => RepositoryError::LockError(msg),
                    rusqlite::ErrorCode::ConstraintViolation => {
                        if msg.contains("UNIQUE") {
                            RepositoryError::UniqueConstraintViolation(msg)
                        } else if msg.contains("FOREIGN KEY") {
                            RepositoryError::ForeignKeyViolation(msg)
                        } else {
                            RepositoryError::ConstraintViolation(msg)
                        }
                    }
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_constraint_kind() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();

        let repo_err: RepositoryError = err.into();
        assert!(matches!(repo_err, RepositoryError::UniqueConstraintViolation(_)));
        assert_eq!(repo_err.failure_kind(), "constraint_violation");
    }

    #[test]
    fn test_check_violation_is_constraint_kind() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (q INTEGER CHECK (q > 0));").unwrap();
        let err = conn.execute("INSERT INTO t VALUES (0)", []).unwrap_err();

        let repo_err: RepositoryError = err.into();
        assert_eq!(repo_err.failure_kind(), "constraint_violation");
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(RepositoryError::DatabaseBusy("x".into()).failure_kind(), "timeout");
        assert_eq!(RepositoryError::LockError("x".into()).failure_kind(), "unavailable");
        assert_eq!(
            RepositoryError::DatabaseQueryError("x".into()).failure_kind(),
            "query_failed"
        );
    }
}
