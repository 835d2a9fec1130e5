// ==========================================
// Tover - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级问题不走此类型（见 RowError），这里只放导入整体失败
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParse(String),

    #[error("文件编码错误（仅支持 UTF-8）: {0}")]
    Encoding(String),

    #[error("未知导入类型: {given}（可选: {valid}）")]
    UnknownImportType { given: String, valid: String },

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for ImportError {
    fn from(err: std::str::Utf8Error) -> Self {
        ImportError::Encoding(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
