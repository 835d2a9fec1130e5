// ==========================================
// Tover - 指标API
// ==========================================
// 职责: 临界库存查询 / KPI 汇总
// 约定: 参数缺省值来自 config_kv；负数或超出时间范围的窗口直接拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ForecastConfigReader;
use crate::domain::metrics::{CriticalStockItem, ForecastParams, MetricsSummary};
use crate::engine::{checked_window_start, ForecastService, KpiEngine};
use crate::importer::FieldCleaner;
use crate::repository::SalesRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 解析区间参数（日期或时间戳文本，空值视为缺省）
///
/// # 返回
/// - Err(InvalidInput): 无法解析，或 from 晚于 to
pub(crate) fn parse_time_range(
    from: Option<&str>,
    to: Option<&str>,
) -> ApiResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let cleaner = FieldCleaner;
    let parse = |label: &str, raw: Option<&str>| -> ApiResult<Option<DateTime<Utc>>> {
        match cleaner.normalize_null(raw) {
            None => Ok(None),
            Some(v) => cleaner
                .parse_timestamp(&v)
                .map(Some)
                .ok_or_else(|| ApiError::InvalidInput(format!("{} 不是有效日期: {}", label, v))),
        }
    };

    let from = parse("from", from)?;
    let to = parse("to", to)?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(ApiError::InvalidInput("from 不能晚于 to".to_string()));
        }
    }
    Ok((from, to))
}

/// 指标API
pub struct MetricsApi<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    workspace_id: String,
    config: Arc<C>,
    forecast: ForecastService<S, C>,
    kpi: KpiEngine<S, C>,
}

impl<S, C> MetricsApi<S, C>
where
    S: SalesRepository,
    C: ForecastConfigReader,
{
    /// 创建新的MetricsApi实例
    pub fn new(workspace_id: impl Into<String>, sales_repo: Arc<S>, config: Arc<C>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            forecast: ForecastService::new(sales_repo.clone(), config.clone()),
            kpi: KpiEngine::new(sales_repo, config.clone()),
            config,
        }
    }

    fn resolve_workspace<'a>(&'a self, workspace_id: Option<&'a str>) -> &'a str {
        workspace_id
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .unwrap_or(&self.workspace_id)
    }

    /// 临界库存
    ///
    /// # 参数
    /// - workspace_id: 缺省为启动配置的工作区
    /// - n_days: 预测窗口（缺省 14）
    /// - lookback_days: 回看窗口（缺省 7）
    pub async fn critical_stock(
        &self,
        workspace_id: Option<&str>,
        n_days: Option<i64>,
        lookback_days: Option<i64>,
    ) -> ApiResult<Vec<CriticalStockItem>> {
        self.critical_stock_at(workspace_id, n_days, lookback_days, Utc::now())
            .await
    }

    /// 临界库存（指定当前时间）
    pub async fn critical_stock_at(
        &self,
        workspace_id: Option<&str>,
        n_days: Option<i64>,
        lookback_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<CriticalStockItem>> {
        let n_days = match n_days {
            Some(v) => v,
            None => self.config.get_default_forecast_days().await?,
        };
        let lookback_days = match lookback_days {
            Some(v) => v,
            None => self.config.get_default_lookback_days().await?,
        };

        if n_days < 0 {
            return Err(ApiError::InvalidInput(format!("days 不能为负数: {}", n_days)));
        }
        if lookback_days < 0 {
            return Err(ApiError::InvalidInput(format!(
                "lookback 不能为负数: {}",
                lookback_days
            )));
        }
        if checked_window_start(now, lookback_days).is_none() {
            return Err(ApiError::InvalidInput(format!(
                "lookback 超出可表示的时间范围: {}",
                lookback_days
            )));
        }

        let params = ForecastParams {
            n_days,
            lookback_days,
            max_items: self.config.get_max_critical_items().await?,
        };

        let items = self
            .forecast
            .critical_stock(self.resolve_workspace(workspace_id), params, now)
            .await?;
        Ok(items)
    }

    /// KPI 汇总
    ///
    /// # 参数
    /// - from / to: 日期或时间戳文本，区间 [from, to)；缺省为最近 30 天
    pub async fn summary(
        &self,
        workspace_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ApiResult<MetricsSummary> {
        let (from, to) = parse_time_range(from, to)?;
        let summary = self
            .kpi
            .summarize(self.resolve_workspace(workspace_id), from, to, Utc::now())
            .await?;
        Ok(summary)
    }
}
