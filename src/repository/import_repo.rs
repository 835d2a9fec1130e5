// ==========================================
// Tover - 导入记录 Repository Trait
// ==========================================
// 职责: imports / import_errors 两张表的数据访问接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::{Import, ImportErrorEntry, ImportSummary, RowError};
use crate::domain::types::ImportStatus;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// ImportRepository Trait
// ==========================================
// 实现者: ImportRepositoryImpl（rusqlite）
#[async_trait]
pub trait ImportRepository: Send + Sync {
    /// 新建导入记录（status = processing）
    async fn create_import(&self, import: &Import) -> RepositoryResult<()>;

    /// 写入终态与汇总
    ///
    /// # 返回
    /// - Err(NotFound): 导入记录不存在
    async fn complete_import(
        &self,
        import_id: &str,
        status: ImportStatus,
        summary: &ImportSummary,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// 批量写入错误日志（保持顺序，单事务）
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    async fn insert_error_log(&self, import_id: &str, errors: &[RowError]) -> RepositoryResult<usize>;

    /// 按 id 查询导入记录
    async fn get_import(&self, import_id: &str) -> RepositoryResult<Option<Import>>;

    /// 工作区导入列表（最新在前）
    ///
    /// # 返回
    /// - (当前页, 总数)
    async fn list_imports(
        &self,
        workspace_id: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<Import>, usize)>;

    /// 导入的错误日志（按行号升序，同行号按写入顺序）
    ///
    /// # 返回
    /// - (当前页, 总数)
    async fn list_import_errors(
        &self,
        import_id: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<(Vec<ImportErrorEntry>, usize)>;
}
