// ==========================================
// Tover - 日志初始化
// ==========================================
// 职责: 安装 tracing 订阅者
// 环境变量: RUST_LOG（级别，默认 info）/ TOVER_LOG_FORMAT（text | json）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析 TOVER_LOG_FORMAT 的取值；无法识别时为 Text
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 初始化日志系统（进程内只调用一次）
///
/// # 示例
/// ```no_run
/// tover::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::parse(std::env::var("TOVER_LOG_FORMAT").ok().as_deref());

    match format {
        // 附带当前 span 字段（import_id 等）
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init(),
    }
}

/// 测试用：debug 级别，输出到测试捕获，可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
