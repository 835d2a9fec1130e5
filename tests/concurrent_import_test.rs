// ==========================================
// 并发导入测试
// ==========================================
// 测试目标: 多个导入同时进行时互不干扰，工作区之间隔离
// ==========================================


use std::sync::Arc;
use std::time::Instant;
use test_helpers::*;
use tover::api::ImportApi;
use tover::config::ConfigManager;
use tover::domain::ImportStatus;
use tover::importer::ImportPipelineImpl;
use tover::logging;
use tover::repository::{ImportRepositoryImpl, SalesRepositoryImpl};

/// 每个工作区使用独立连接
fn create_api(db_path: &str, workspace_id: &str) -> ImportApi {
    let import_repo = Arc::new(ImportRepositoryImpl::new(db_path).expect("Failed to create repo"));
    let sales_repo = Arc::new(SalesRepositoryImpl::new(db_path).expect("Failed to create repo"));
    let config = Arc::new(ConfigManager::new(db_path).expect("Failed to create config"));

    let pipeline = Arc::new(ImportPipelineImpl::new(
        import_repo.clone(),
        sales_repo,
        config,
    ));
    ImportApi::new(workspace_id, pipeline, import_repo)
}

fn order_rows(prefix: &str, n: usize) -> Vec<u8> {
    let rows: Vec<String> = (0..n)
        .map(|i| format!("ozon,{}-{},2025-01-10T10:00:00Z,usd,paid", prefix, i))
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    csv(ORDERS_HEADER, &refs)
}

#[tokio::test]
async fn test_concurrent_imports_across_workspaces() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api_a = create_api(&db_path, "ws_a");
    let api_b = create_api(&db_path, "ws_b");

    // 相同外部 id 在不同工作区各自落库
    let bytes_a = order_rows("o", 120);
    let bytes_b = order_rows("o", 80);

    let start = Instant::now();
    let (res_a, res_b) = tokio::join!(
        api_a.import_file(&bytes_a, "orders_csv", "a.csv"),
        api_b.import_file(&bytes_b, "orders_csv", "b.csv"),
    );
    let elapsed = start.elapsed();
    println!("并发导入耗时: {:?}", elapsed);

    let out_a = res_a.expect("ws_a 导入失败");
    let out_b = res_b.expect("ws_b 导入失败");
    assert_eq!(out_a.status, ImportStatus::Completed);
    assert_eq!(out_b.status, ImportStatus::Completed);

    let env = setup_env(&db_path);
    assert_eq!(count_rows(&env.conn, "orders"), 200);

    let listed_a = api_a.list_imports(None, None).await.unwrap();
    let listed_b = api_b.list_imports(None, None).await.unwrap();
    assert_eq!(listed_a.total, 1);
    assert_eq!(listed_b.total, 1);
    assert_eq!(listed_a.items[0].id, out_a.import_id);
    assert_eq!(listed_b.items[0].id, out_b.import_id);
}

#[tokio::test]
async fn test_concurrent_imports_of_different_kinds() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let env = setup_env(&db_path);

    let orders = order_rows("o", 10);
    let inventory = csv(INVENTORY_HEADER, &["2025-01-10,SKU-A,5,1", "2025-01-10,SKU-B,6,1"]);
    let payments = csv(PAYMENTS_HEADER, &["stripe,p1,10,0.3,usd,2025-01-10"]);

    let (o, i, p) = tokio::join!(
        env.import_api.import_file(&orders, "orders_csv", "o.csv"),
        env.import_api.import_file(&inventory, "inventory_csv", "i.csv"),
        env.import_api.import_file(&payments, "payments_csv", "p.csv"),
    );

    for outcome in [o.unwrap(), i.unwrap(), p.unwrap()] {
        assert_eq!(outcome.status, ImportStatus::Completed);
        assert!(outcome.errors.is_empty());
    }
    assert_eq!(count_rows(&env.conn, "orders"), 10);
    assert_eq!(count_rows(&env.conn, "inventory_snapshots"), 2);
    assert_eq!(count_rows(&env.conn, "payments"), 1);

    let imports = env.import_api.list_imports(None, None).await.unwrap();
    assert_eq!(imports.total, 3);
}
