// ==========================================
// Tover - 销售窗口公共逻辑
// ==========================================
// 职责: 按订单 id 分批并发拉取订单行 / 展示用四舍五入
// 约束: 每批 id 数不超过 lookup_batch_size
// ==========================================

use crate::config::config_limits;
use crate::domain::records::OrderLineFact;
use crate::repository::error::RepositoryResult;
use crate::repository::SalesRepository;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::debug;

/// 分批拉取订单行，各批并发执行后合并
///
/// # 参数
/// - repo: 销售数据仓储
/// - order_ids: 订单 id
/// - chunk_size: 每批 id 数（收敛到 1..=100）
///
/// # 返回
/// - 合并后的订单行；任一批失败则返回该错误
pub async fn fetch_lines_for_orders<S>(
    repo: &S,
    order_ids: &[String],
    chunk_size: usize,
) -> RepositoryResult<Vec<OrderLineFact>>
where
    S: SalesRepository + ?Sized,
{
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = chunk_size.clamp(1, config_limits::FORECAST_LOOKUP_BATCH_SIZE);
    let chunks: Vec<&[String]> = order_ids.chunks(chunk_size).collect();
    debug!(orders = order_ids.len(), batches = chunks.len(), "分批拉取订单行");

    let results = join_all(
        chunks
            .iter()
            .map(|chunk| repo.fetch_order_lines_by_order_ids(chunk)),
    )
    .await;

    let mut lines = Vec::new();
    for result in results {
        lines.extend(result?);
    }
    Ok(lines)
}

/// 窗口起点 end - days 天；超出可表示的时间范围时为 None
pub fn checked_window_start(end: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| end.checked_sub_signed(d))
}

/// 窗口起点，超出范围时取最早可表示时间
pub fn window_start(end: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    checked_window_start(end, days).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// 四舍五入到指定小数位
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.234, 2), 1.23);
        assert_eq!(round_dp(1.235, 1), 1.2);
        assert_eq!(round_dp(70.04, 1), 70.0);
        assert_eq!(round_dp(3.0, 2), 3.0);
    }

    #[test]
    fn test_window_start_saturates() {
        use chrono::TimeZone;
        let end = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();

        assert_eq!(
            checked_window_start(end, 14),
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(checked_window_start(end, 1_000_000_000), None);
        assert_eq!(checked_window_start(end, i64::MAX), None);
        assert_eq!(window_start(end, 1_000_000_000), DateTime::<Utc>::MIN_UTC);
    }
}
