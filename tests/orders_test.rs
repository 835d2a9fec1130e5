// ==========================================
// 订单浏览集成测试
// ==========================================
// 覆盖: 区间与排序 / 订单 GMV 与件数 / 分页 / 订单行明细 / 参数校验
// ==========================================


use chrono::{DateTime, TimeZone, Utc};
use test_helpers::*;
use tover::api::ApiError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
}

async fn seed(env: &TestEnv) {
    let orders = csv(
        ORDERS_HEADER,
        &[
            "ozon,o1,2025-01-10T09:00:00Z,usd,paid",
            "ozon,o2,2025-01-12T09:00:00Z,usd,cancelled",
            "wb,o3,2024-12-01T09:00:00Z,eur,paid",
            "ozon,o4,2025-01-13T09:00:00Z,usd,",
        ],
    );
    let lines = csv(
        LINES_HEADER,
        &[
            "ozon,o1,SKU-C,7,2",
            "ozon,o1,SKU-A,7,10",
            "ozon,o1,SKU-B,14,1.005",
            "ozon,o2,SKU-B,100,1",
            "wb,o3,SKU-C,1000,1",
        ],
    );

    for (bytes, kind) in [(orders, "orders_csv"), (lines, "order_lines_csv")] {
        let outcome = env.import_api.import_file(&bytes, kind, "seed.csv").await.unwrap();
        assert!(outcome.errors.is_empty(), "{} 导入出错: {:?}", kind, outcome.errors);
    }
}

#[tokio::test]
async fn test_list_orders_newest_first_with_totals() {
    tover::logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);
    seed(&env).await;

    let page = env
        .orders_api
        .list_orders_at(None, None, None, None, None, now())
        .await
        .unwrap();

    // 默认最近 30 天：o3 在区间外；取消订单照常列出
    assert_eq!(page.total, 3);
    assert_eq!(page.limit, 50);
    let ext: Vec<&str> = page.items.iter().map(|o| o.external_order_id.as_str()).collect();
    assert_eq!(ext, vec!["o4", "o2", "o1"]);

    assert_eq!(page.items[0].status, "created");
    assert_eq!(page.items[0].order_gmv, 0.0);
    assert_eq!(page.items[0].order_units, 0);

    assert_eq!(page.items[1].order_gmv, 100.0);
    assert_eq!(page.items[1].order_units, 100);

    // 14 + 70 + 14.07 = 98.07
    assert_eq!(page.items[2].order_gmv, 98.07);
    assert_eq!(page.items[2].order_units, 28);
    assert_eq!(page.items[2].currency, "USD");

    let json = serde_json::to_value(&page.items[2]).unwrap();
    assert!(json.get("orderGmv").is_some());
    assert!(json.get("externalOrderId").is_some());
}

#[tokio::test]
async fn test_list_orders_range_is_half_open() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);
    seed(&env).await;

    let page = env
        .orders_api
        .list_orders_at(None, Some("2024-11-01"), Some("2025-01-12T09:00:00Z"), None, None, now())
        .await
        .unwrap();
    let ext: Vec<&str> = page.items.iter().map(|o| o.external_order_id.as_str()).collect();
    assert_eq!(ext, vec!["o1", "o3"]);

    let page = env
        .orders_api
        .list_orders_at(None, Some("2025-01-12T09:00:00Z"), Some("2025-01-12T09:00:01Z"), None, None, now())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].external_order_id, "o2");
}

#[tokio::test]
async fn test_list_orders_pagination() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);
    seed(&env).await;

    let page = env
        .orders_api
        .list_orders_at(None, Some("2024-11-01"), Some("2025-02-01"), Some(2), Some(1), now())
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.offset, 1);
    let ext: Vec<&str> = page.items.iter().map(|o| o.external_order_id.as_str()).collect();
    assert_eq!(ext, vec!["o2", "o1"]);

    let beyond = env
        .orders_api
        .list_orders_at(None, Some("2024-11-01"), Some("2025-02-01"), Some(10), Some(10), now())
        .await
        .unwrap();
    assert_eq!(beyond.total, 4);
    assert!(beyond.items.is_empty());
}

#[tokio::test]
async fn test_list_orders_rejects_bad_range() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);

    let err = env
        .orders_api
        .list_orders_at(None, Some("2025-02-01"), Some("2025-01-01"), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = env
        .orders_api
        .list_orders_at(None, Some("yesterday"), None, None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_order_lines_sorted_by_sku() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);
    seed(&env).await;

    let page = env
        .orders_api
        .list_orders_at(None, None, None, None, None, now())
        .await
        .unwrap();
    let o1 = page
        .items
        .iter()
        .find(|o| o.external_order_id == "o1")
        .unwrap();

    let lines = env.orders_api.list_order_lines(None, &o1.id).await.unwrap();
    assert_eq!(lines.order_id, o1.id);
    let skus: Vec<&str> = lines.items.iter().map(|l| l.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-A", "SKU-B", "SKU-C"]);
    assert_eq!(lines.items[0].line_gmv, 70.0);
    assert_eq!(lines.items[1].line_gmv, 14.07);
    assert_eq!(lines.items[1].discount_amount, 0.0);

    let json = serde_json::to_value(&lines).unwrap();
    assert!(json["items"][0].get("lineGmv").is_some());
    assert!(json.get("orderId").is_some());
}

#[tokio::test]
async fn test_order_lines_not_found() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let env = setup_env(&db_path);
    seed(&env).await;

    let err = env.orders_api.list_order_lines(None, "nope").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let page = env
        .orders_api
        .list_orders_at(None, None, None, None, None, now())
        .await
        .unwrap();
    let other = env
        .orders_api
        .list_order_lines(Some("other"), &page.items[0].id)
        .await
        .unwrap_err();
    assert!(matches!(other, ApiError::NotFound(_)));

    let empty = env.orders_api.list_order_lines(None, "  ").await.unwrap_err();
    assert!(matches!(empty, ApiError::InvalidInput(_)));
}
