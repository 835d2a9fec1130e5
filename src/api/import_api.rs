// ==========================================
// Tover - 导入API
// ==========================================
// 职责: 上传入口 / 导入记录查询 / 错误日志分页
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::import::{Import, ImportErrorEntry, ImportOutcome, Page};
use crate::domain::types::ImportType;
use crate::importer::{ImportError, ImportPipeline};
use crate::repository::ImportRepository;
use std::sync::Arc;
use tracing::info;

/// 导入列表默认每页条数
pub const DEFAULT_IMPORTS_LIMIT: usize = 20;
/// 错误日志默认每页条数
pub const DEFAULT_ERRORS_LIMIT: usize = 50;
/// 每页上限
pub const MAX_PAGE_LIMIT: usize = 500;

/// 分页参数归一化：limit ∈ [1, 500]，offset >= 0
pub fn clamp_page(limit: Option<i64>, offset: Option<i64>, default_limit: usize) -> (usize, usize) {
    let limit = limit
        .map(|l| l.clamp(1, MAX_PAGE_LIMIT as i64) as usize)
        .unwrap_or(default_limit);
    let offset = offset.map(|o| o.max(0) as usize).unwrap_or(0);
    (limit, offset)
}

/// 导入API
pub struct ImportApi {
    workspace_id: String,
    pipeline: Arc<dyn ImportPipeline>,
    import_repo: Arc<dyn ImportRepository>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - workspace_id: 当前工作区（由启动配置注入）
    /// - pipeline: 导入管道
    /// - import_repo: 导入记录仓储
    pub fn new(
        workspace_id: impl Into<String>,
        pipeline: Arc<dyn ImportPipeline>,
        import_repo: Arc<dyn ImportRepository>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            pipeline,
            import_repo,
        }
    }

    /// 上传并导入一个文件
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - import_type_tag: orders_csv / order_lines_csv / inventory_csv / payments_csv
    /// - file_name: 原始文件名
    ///
    /// # 返回
    /// - Ok(ImportOutcome): importId / status / summary（表头失败时 status = failed）
    /// - Err(InvalidInput): 未知导入类型
    /// - Err(ImportError): 文件无法解析
    pub async fn import_file(
        &self,
        bytes: &[u8],
        import_type_tag: &str,
        file_name: &str,
    ) -> ApiResult<ImportOutcome> {
        let import_type: ImportType = import_type_tag.parse().map_err(|_| {
            ImportError::UnknownImportType {
                given: import_type_tag.trim().to_string(),
                valid: ImportType::valid_tags(),
            }
        })?;

        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
        }

        let outcome = self
            .pipeline
            .run_import(&self.workspace_id, file_name, import_type, bytes)
            .await?;

        info!(
            import_id = %outcome.import_id,
            status = %outcome.status,
            "导入请求完成"
        );
        Ok(outcome)
    }

    /// 查询单个导入记录
    pub async fn get_import(&self, import_id: &str) -> ApiResult<Import> {
        self.import_repo
            .get_import(import_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("导入记录(id={})不存在", import_id)))
    }

    /// 当前工作区的导入列表（最新在前）
    pub async fn list_imports(&self, limit: Option<i64>, offset: Option<i64>) -> ApiResult<Page<Import>> {
        let (limit, offset) = clamp_page(limit, offset, DEFAULT_IMPORTS_LIMIT);
        let (items, total) = self
            .import_repo
            .list_imports(&self.workspace_id, limit, offset)
            .await?;

        Ok(Page {
            limit,
            offset,
            total,
            items,
        })
    }

    /// 导入的错误日志（按行号升序）
    pub async fn list_import_errors(
        &self,
        import_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ApiResult<Page<ImportErrorEntry>> {
        // 先确认导入记录存在
        self.get_import(import_id).await?;

        let (limit, offset) = clamp_page(limit, offset, DEFAULT_ERRORS_LIMIT);
        let (items, total) = self
            .import_repo
            .list_import_errors(import_id, limit, offset)
            .await?;

        Ok(Page {
            limit,
            offset,
            total,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(None, None, 20), (20, 0));
        assert_eq!(clamp_page(Some(0), Some(-5), 20), (1, 0));
        assert_eq!(clamp_page(Some(10_000), Some(40), 50), (500, 40));
        assert_eq!(clamp_page(Some(7), None, 50), (7, 0));
    }
}
