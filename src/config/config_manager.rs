// ==========================================
// Tover - 配置管理器
// ==========================================
// 职责: 配置查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 约定: 配置缺失或格式错误时使用默认值，不报错
// ==========================================

use crate::config::config_reader::{ForecastConfigReader, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Clone)]
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value,
                 updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 获取全部 global 配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = BTreeMap::new();
        for row in rows {
            let (k, v) = row?;
            map.insert(k, v);
        }
        Ok(map)
    }

    /// 读取并解析配置，缺失或无法解析时返回默认值
    ///
    /// `accept` 用于拒绝语义上非法的值（如 0 批次）
    fn get_parsed_or_default<T>(
        &self,
        key: &str,
        default: T,
        accept: impl Fn(&T) -> bool,
    ) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) if accept(&v) => Ok(v),
            _ => {
                warn!(key = key, value = %raw, default = %default, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 导入
    pub const UPSERT_BATCH_SIZE: &str = "import.upsert_batch_size";

    // 临界库存预测
    pub const FORECAST_DEFAULT_DAYS: &str = "forecast.default_days";
    pub const FORECAST_DEFAULT_LOOKBACK_DAYS: &str = "forecast.default_lookback_days";
    pub const FORECAST_MAX_ITEMS: &str = "forecast.max_items";
    pub const FORECAST_LOOKUP_BATCH_SIZE: &str = "forecast.lookup_batch_size";

    // KPI 汇总
    pub const METRICS_DEFAULT_RANGE_DAYS: &str = "metrics.default_range_days";
}

// ==========================================
// 默认值
// ==========================================
pub mod config_defaults {
    pub const UPSERT_BATCH_SIZE: usize = 500;
    pub const FORECAST_DEFAULT_DAYS: i64 = 14;
    pub const FORECAST_DEFAULT_LOOKBACK_DAYS: i64 = 7;
    pub const FORECAST_MAX_ITEMS: usize = 50;
    pub const FORECAST_LOOKUP_BATCH_SIZE: usize = 100;
    pub const METRICS_DEFAULT_RANGE_DAYS: i64 = 30;
}

// ==========================================
// 上限（覆写值超出时回退默认值）
// ==========================================
pub mod config_limits {
    pub const FORECAST_MAX_ITEMS: usize = 50;
    pub const FORECAST_LOOKUP_BATCH_SIZE: usize = 100;
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_upsert_batch_size(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::UPSERT_BATCH_SIZE,
            config_defaults::UPSERT_BATCH_SIZE,
            |v| *v > 0,
        )
    }
}

#[async_trait]
impl ForecastConfigReader for ConfigManager {
    async fn get_default_forecast_days(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(
            config_keys::FORECAST_DEFAULT_DAYS,
            config_defaults::FORECAST_DEFAULT_DAYS,
            |v| *v >= 0,
        )
    }

    async fn get_default_lookback_days(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(
            config_keys::FORECAST_DEFAULT_LOOKBACK_DAYS,
            config_defaults::FORECAST_DEFAULT_LOOKBACK_DAYS,
            |v| *v >= 0,
        )
    }

    async fn get_max_critical_items(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::FORECAST_MAX_ITEMS,
            config_defaults::FORECAST_MAX_ITEMS,
            |v| (1..=config_limits::FORECAST_MAX_ITEMS).contains(v),
        )
    }

    async fn get_lookup_batch_size(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::FORECAST_LOOKUP_BATCH_SIZE,
            config_defaults::FORECAST_LOOKUP_BATCH_SIZE,
            |v| (1..=config_limits::FORECAST_LOOKUP_BATCH_SIZE).contains(v),
        )
    }

    async fn get_default_range_days(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(
            config_keys::METRICS_DEFAULT_RANGE_DAYS,
            config_defaults::METRICS_DEFAULT_RANGE_DAYS,
            |v| *v > 0,
        )
    }
}
