// ==========================================
// Tover - 导入管道实现
// ==========================================
// 职责: 整合导入流程，从上传内容到数据库
// 流程: 解析 → 表头闸门 → 行校验 → (订单行: 父订单解析) → 分批落库 → 错误日志 → 终态
// 失败策略:
// - 行级错误不中断导入
// - 批次落库失败降级为一条 DB_ERROR（row_number = 0），已成功批次不回滚
// - 不自动重试；重新上传是安全的（自然键 upsert）
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{Import, ImportOutcome, ImportSummary, RawRow, RowError, Validated};
use crate::domain::types::{ImportStatus, ImportType};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::CsvParser;
use crate::importer::header_validator::validate_headers;
use crate::importer::import_pipeline_trait::ImportPipeline;
use crate::importer::order_line_resolver::OrderLineResolver;
use crate::importer::row_validator::{
    InventoryRowValidator, OrderLineRowValidator, OrderRowValidator, PaymentRowValidator,
    RowValidator,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{ImportRepository, SalesRepository};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 批次落库失败 → DB_ERROR（失败类别 + 行号区间）
fn batch_db_error<T>(err: &RepositoryError, chunk: &[Validated<T>]) -> RowError {
    let first = chunk.first().map(|v| v.raw.row_number).unwrap_or(0);
    let last = chunk.last().map(|v| v.raw.row_number).unwrap_or(first);
    RowError::db_error(format!(
        "{}: rows {}-{}: {}",
        err.failure_kind(),
        first,
        last,
        err
    ))
}

/// 分批写入
///
/// # 返回
/// - (成功写入数, 失败批次对应的 DB_ERROR)
async fn persist_in_batches<'a, T, F>(
    items: &'a [Validated<T>],
    batch_size: usize,
    mut write: F,
) -> (usize, Vec<RowError>)
where
    T: Clone + Send + Sync + 'a,
    F: FnMut(Vec<T>) -> BoxFuture<'a, RepositoryResult<usize>> + Send,
{
    let mut inserted = 0;
    let mut errors = Vec::new();

    for (batch_idx, chunk) in items.chunks(batch_size.max(1)).enumerate() {
        let records: Vec<T> = chunk.iter().map(|v| v.record.clone()).collect();
        match write(records).await {
            Ok(n) => {
                inserted += n;
                debug!(batch = batch_idx, count = n, "批次落库完成");
            }
            Err(e) => {
                warn!(
                    batch = batch_idx,
                    size = chunk.len(),
                    kind = e.failure_kind(),
                    error = %e,
                    "批次落库失败"
                );
                errors.push(batch_db_error(&e, chunk));
            }
        }
    }

    (inserted, errors)
}

// ==========================================
// ImportPipelineImpl - 导入管道实现
// ==========================================
pub struct ImportPipelineImpl<R, S, C>
where
    R: ImportRepository,
    S: SalesRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: Arc<R>,
    sales_repo: Arc<S>,

    // 配置读取器
    config: Arc<C>,

    // 导入组件
    parser: CsvParser,
    resolver: OrderLineResolver,
}

impl<R, S, C> ImportPipelineImpl<R, S, C>
where
    R: ImportRepository,
    S: SalesRepository,
    C: ImportConfigReader,
{
    /// 创建导入管道
    ///
    /// # 参数
    /// - import_repo: 导入记录仓储
    /// - sales_repo: 业务数据仓储
    /// - config: 配置读取器
    pub fn new(import_repo: Arc<R>, sales_repo: Arc<S>, config: Arc<C>) -> Self {
        Self {
            import_repo,
            sales_repo,
            config,
            parser: CsvParser,
            resolver: OrderLineResolver,
        }
    }

    /// 写入终态
    async fn finish(
        &self,
        import_id: &str,
        status: ImportStatus,
        summary: &ImportSummary,
    ) -> ImportResult<()> {
        self.import_repo
            .complete_import(import_id, status, summary, Utc::now())
            .await?;
        Ok(())
    }

    // ===== 各导入类型 =====

    async fn import_orders(
        &self,
        workspace_id: &str,
        rows: &[RawRow],
        batch_size: usize,
    ) -> (usize, Vec<RowError>) {
        let result = OrderRowValidator::new().validate_rows(rows);
        info!(valid = result.valid.len(), invalid = result.errors.len(), "订单行校验完成");

        let mut errors = result.errors;
        let repo = &self.sales_repo;
        let (inserted, db_errors) = persist_in_batches(&result.valid, batch_size, |batch| {
            async move { repo.upsert_orders(workspace_id, &batch).await }.boxed()
        })
        .await;

        errors.extend(db_errors);
        (inserted, errors)
    }

    async fn import_order_lines(
        &self,
        workspace_id: &str,
        rows: &[RawRow],
        batch_size: usize,
    ) -> (usize, Vec<RowError>) {
        let result = OrderLineRowValidator::new().validate_rows(rows);
        info!(valid = result.valid.len(), invalid = result.errors.len(), "订单行明细校验完成");

        let mut errors = result.errors;
        if result.valid.is_empty() {
            return (0, errors);
        }

        // 阶段 1: 批量解析父订单（全部完成后才插入）
        let keys = self.resolver.distinct_keys(&result.valid);
        debug!(distinct_orders = keys.len(), "父订单查找");
        let found = match self.sales_repo.find_order_ids(workspace_id, &keys).await {
            Ok(found) => found,
            Err(e) => {
                warn!(kind = e.failure_kind(), error = %e, "父订单查找失败");
                errors.push(batch_db_error(&e, &result.valid));
                return (0, errors);
            }
        };

        let resolution = self.resolver.split(result.valid, &found);
        if !resolution.missing.is_empty() {
            warn!(missing = resolution.missing.len(), "部分订单行找不到父订单");
        }
        errors.extend(resolution.missing);

        // 阶段 2: 插入订单行
        let repo = &self.sales_repo;
        let (inserted, db_errors) =
            persist_in_batches(&resolution.resolved, batch_size, |batch| {
                async move { repo.insert_order_lines(&batch).await }.boxed()
            })
            .await;

        errors.extend(db_errors);
        (inserted, errors)
    }

    async fn import_inventory(
        &self,
        workspace_id: &str,
        rows: &[RawRow],
        batch_size: usize,
    ) -> (usize, Vec<RowError>) {
        let result = InventoryRowValidator::new().validate_rows(rows);
        info!(valid = result.valid.len(), invalid = result.errors.len(), "库存快照校验完成");

        let mut errors = result.errors;
        let repo = &self.sales_repo;
        let (inserted, db_errors) = persist_in_batches(&result.valid, batch_size, |batch| {
            async move { repo.upsert_inventory_snapshots(workspace_id, &batch).await }.boxed()
        })
        .await;

        errors.extend(db_errors);
        (inserted, errors)
    }

    async fn import_payments(
        &self,
        workspace_id: &str,
        rows: &[RawRow],
        batch_size: usize,
    ) -> (usize, Vec<RowError>) {
        let result = PaymentRowValidator::new().validate_rows(rows);
        info!(valid = result.valid.len(), invalid = result.errors.len(), "支付校验完成");

        let mut errors = result.errors;
        let repo = &self.sales_repo;
        let (inserted, db_errors) = persist_in_batches(&result.valid, batch_size, |batch| {
            async move { repo.upsert_payments(workspace_id, &batch).await }.boxed()
        })
        .await;

        errors.extend(db_errors);
        (inserted, errors)
    }
}

#[async_trait]
impl<R, S, C> ImportPipeline for ImportPipelineImpl<R, S, C>
where
    R: ImportRepository,
    S: SalesRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, bytes), fields(import_id, size = bytes.len()))]
    async fn run_import(
        &self,
        workspace_id: &str,
        file_name: &str,
        import_type: ImportType,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let import_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("import_id", import_id.as_str());

        // === 步骤 1: 创建导入记录 ===
        let import = Import {
            id: import_id.clone(),
            workspace_id: workspace_id.to_string(),
            file_name: file_name.to_string(),
            import_type,
            status: ImportStatus::Processing,
            summary: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.import_repo.create_import(&import).await?;
        info!(import_type = %import_type, file_name = file_name, "开始导入");

        // === 步骤 2: 解析 ===
        let parsed = match self.parser.parse_bytes(bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "文件解析失败");
                let summary = ImportSummary::Rejected {
                    error: e.to_string(),
                };
                self.finish(&import_id, ImportStatus::Failed, &summary).await?;
                return Err(e);
            }
        };

        if parsed.is_empty() {
            info!("文件无数据行，直接完成");
            let summary = ImportSummary::zero();
            self.finish(&import_id, ImportStatus::Completed, &summary).await?;
            return Ok(ImportOutcome {
                import_id,
                status: ImportStatus::Completed,
                summary,
                errors: Vec::new(),
            });
        }

        // === 步骤 3: 表头校验 ===
        if let Some(header_error) = validate_headers(import_type, &parsed.headers) {
            warn!(error = %header_error, "表头校验失败");
            let summary = ImportSummary::Rejected {
                error: header_error,
            };
            self.finish(&import_id, ImportStatus::Failed, &summary).await?;
            return Ok(ImportOutcome {
                import_id,
                status: ImportStatus::Failed,
                summary,
                errors: Vec::new(),
            });
        }

        // === 步骤 4-5: 行校验 + 分批落库 ===
        let batch_size = self.config.get_upsert_batch_size().await?;
        let total_rows = parsed.rows.len();
        let rows = &parsed.rows;

        let (inserted, errors) = match import_type {
            ImportType::Orders => self.import_orders(workspace_id, rows, batch_size).await,
            ImportType::OrderLines => self.import_order_lines(workspace_id, rows, batch_size).await,
            ImportType::Inventory => self.import_inventory(workspace_id, rows, batch_size).await,
            ImportType::Payments => self.import_payments(workspace_id, rows, batch_size).await,
        };

        // === 步骤 6: 错误日志 + 终态 ===
        self.import_repo.insert_error_log(&import_id, &errors).await?;

        let status = if !errors.is_empty() && inserted == 0 {
            ImportStatus::Failed
        } else {
            ImportStatus::Completed
        };
        let summary = ImportSummary::Counts {
            total_rows,
            inserted,
            errors: errors.len(),
        };
        self.finish(&import_id, status, &summary).await?;

        info!(
            status = %status,
            total_rows = total_rows,
            inserted = inserted,
            errors = errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入完成"
        );

        Ok(ImportOutcome {
            import_id,
            status,
            summary,
            errors,
        })
    }
}
