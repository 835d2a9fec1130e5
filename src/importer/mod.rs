// ==========================================
// Tover - 导入层
// ==========================================
// 职责: CSV 上传 → 校验 → 落库，部分失败可追溯
// 支持: orders_csv / order_lines_csv / inventory_csv / payments_csv
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod header_validator;
pub mod import_pipeline_impl;
pub mod import_pipeline_trait;
pub mod order_line_resolver;
pub mod row_validator;

// 重导出核心类型
pub use data_cleaner::FieldCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ParsedCsv};
pub use header_validator::validate_headers;
pub use import_pipeline_impl::ImportPipelineImpl;
pub use order_line_resolver::{LineResolution, OrderLineResolver, ResolvedLine};
pub use row_validator::{
    InventoryRowValidator, OrderLineRowValidator, OrderRowValidator, PaymentRowValidator,
    RowValidator,
};

// 重导出 Trait 接口
pub use import_pipeline_trait::ImportPipeline;
