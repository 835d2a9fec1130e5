// ==========================================
// Tover - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约定: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, MetricsApi, OrdersApi};
use crate::config::ConfigManager;
use crate::importer::ImportPipelineImpl;
use crate::repository::{ImportRepositoryImpl, SalesRepositoryImpl};

/// 未配置时使用的工作区
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 当前工作区
    pub workspace_id: String,

    /// 导入API
    pub import_api: Arc<ImportApi>,

    /// 指标API
    pub metrics_api: Arc<MetricsApi<SalesRepositoryImpl, ConfigManager>>,

    /// 订单API
    pub orders_api: Arc<OrdersApi<SalesRepositoryImpl, ConfigManager>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - workspace_id: 当前工作区
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String, workspace_id: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, workspace_id = %workspace_id, "初始化AppState");

        // 打开共享连接并迁移 schema
        let conn = crate::db::open_and_migrate(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let import_repo = Arc::new(ImportRepositoryImpl::from_connection(conn.clone()));
        let sales_repo = Arc::new(SalesRepositoryImpl::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let pipeline = Arc::new(ImportPipelineImpl::new(
            import_repo.clone(),
            sales_repo.clone(),
            config_manager.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(workspace_id.clone(), pipeline, import_repo));
        let metrics_api = Arc::new(MetricsApi::new(
            workspace_id.clone(),
            sales_repo.clone(),
            config_manager.clone(),
        ));
        let orders_api = Arc::new(OrdersApi::new(
            workspace_id.clone(),
            sales_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            workspace_id,
            import_api,
            metrics_api,
            orders_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: TOVER_DB_PATH > 用户数据目录/tover/tover.db > ./tover.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("TOVER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./tover.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("tover");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("tover.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 获取当前工作区 id（TOVER_WORKSPACE_ID，缺省 default）
pub fn get_workspace_id() -> String {
    std::env::var("TOVER_WORKSPACE_ID")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_WORKSPACE_ID.to_string())
}
