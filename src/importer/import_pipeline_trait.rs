// ==========================================
// Tover - 导入管道 Trait
// ==========================================
// 职责: 定义导入主接口（不包含实现）
// ==========================================

use crate::domain::import::ImportOutcome;
use crate::domain::types::ImportType;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportPipeline Trait
// ==========================================
// 实现者: ImportPipelineImpl
#[async_trait]
pub trait ImportPipeline: Send + Sync {
    /// 执行一次导入
    ///
    /// # 参数
    /// - workspace_id: 工作区
    /// - file_name: 上传文件名（仅记录）
    /// - import_type: 导入类型
    /// - bytes: 文件内容（UTF-8 CSV）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入 id、终态、汇总与行错误
    /// - Err: 文件无法解析，或导入记录/错误日志无法写入
    ///
    /// # 导入流程
    /// 1. 创建导入记录（processing）
    /// 2. 解析；无数据行直接 completed
    /// 3. 表头校验；失败则 failed 并返回
    /// 4. 行校验分区
    /// 5. 分批 upsert（订单行先批量解析父订单）
    /// 6. 写入错误日志，更新终态与汇总
    async fn run_import(
        &self,
        workspace_id: &str,
        file_name: &str,
        import_type: ImportType,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome>;
}
