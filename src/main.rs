// ==========================================
// Tover - 本地运行入口
// ==========================================
// 用法:
//   tover import <orders_csv|order_lines_csv|inventory_csv|payments_csv> <file>
//   tover imports [limit] [offset]
//   tover errors <import_id> [limit] [offset]
//   tover critical-stock [days] [lookback]
//   tover summary [from] [to]
//   tover orders [from] [to] [limit] [offset]
//   tover order-lines <order_id>
//   tover config [key value]
// 环境变量: TOVER_DB_PATH / TOVER_WORKSPACE_ID / TOVER_LOG_FORMAT / RUST_LOG
// ==========================================

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use tover::app::{get_default_db_path, get_workspace_id, AppState};

const USAGE: &str =
    "用法: tover <import|imports|errors|critical-stock|summary|orders|order-lines|config> [参数...]";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_opt_i64(arg: Option<&String>, name: &str) -> anyhow::Result<Option<i64>> {
    arg.map(|v| {
        v.trim()
            .parse::<i64>()
            .with_context(|| format!("{} 不是整数: {}", name, v))
    })
    .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tover::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().ok_or_else(|| anyhow!(USAGE))?;
    let rest = &args[1..];

    let db_path = get_default_db_path();
    let workspace_id = get_workspace_id();
    tracing::info!(version = tover::VERSION, db_path = %db_path, workspace_id = %workspace_id, "tover 启动");

    let state = AppState::new(db_path, workspace_id).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "import" => {
            let (kind, path) = match (rest.first(), rest.get(1)) {
                (Some(k), Some(p)) => (k, p),
                _ => bail!("用法: tover import <类型> <文件>"),
            };
            let bytes = std::fs::read(path).with_context(|| format!("无法读取文件: {}", path))?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());

            let outcome = state.import_api.import_file(&bytes, kind, &file_name).await?;
            print_json(&outcome)?;
        }
        "imports" => {
            let limit = parse_opt_i64(rest.first(), "limit")?;
            let offset = parse_opt_i64(rest.get(1), "offset")?;
            let page = state.import_api.list_imports(limit, offset).await?;
            print_json(&page)?;
        }
        "errors" => {
            let import_id = rest
                .first()
                .ok_or_else(|| anyhow!("用法: tover errors <import_id> [limit] [offset]"))?;
            let limit = parse_opt_i64(rest.get(1), "limit")?;
            let offset = parse_opt_i64(rest.get(2), "offset")?;
            let page = state
                .import_api
                .list_import_errors(import_id, limit, offset)
                .await?;
            print_json(&page)?;
        }
        "critical-stock" => {
            let days = parse_opt_i64(rest.first(), "days")?;
            let lookback = parse_opt_i64(rest.get(1), "lookback")?;
            let items = state.metrics_api.critical_stock(None, days, lookback).await?;
            print_json(&items)?;
        }
        "summary" => {
            let from = rest.first().map(String::as_str);
            let to = rest.get(1).map(String::as_str);
            let summary = state.metrics_api.summary(None, from, to).await?;
            print_json(&summary)?;
        }
        "orders" => {
            let from = rest.first().map(String::as_str);
            let to = rest.get(1).map(String::as_str);
            let limit = parse_opt_i64(rest.get(2), "limit")?;
            let offset = parse_opt_i64(rest.get(3), "offset")?;
            let page = state
                .orders_api
                .list_orders(None, from, to, limit, offset)
                .await?;
            print_json(&page)?;
        }
        "order-lines" => {
            let order_id = rest
                .first()
                .ok_or_else(|| anyhow!("用法: tover order-lines <order_id>"))?;
            let lines = state.orders_api.list_order_lines(None, order_id).await?;
            print_json(&lines)?;
        }
        "config" => match (rest.first(), rest.get(1)) {
            (Some(key), Some(value)) => {
                state.config_manager.set_global_config_value(key, value)?;
                print_json(&state.config_manager.get_config_snapshot()?)?;
            }
            (None, _) => print_json(&state.config_manager.get_config_snapshot()?)?,
            _ => bail!("用法: tover config <key> <value>"),
        },
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
