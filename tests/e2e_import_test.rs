// ==========================================
// 导入链路端到端测试
// ==========================================
// 测试目标: CSV 文件 → 批次报告 → 落库行的完整链路
// ==========================================


use master_code_sync::domain::{BatchStatus, RowErrorCode};
use master_code_sync::importer::{ProductImporterImpl, RowValidatorImpl, UniversalFileParser};
use master_code_sync::repository::{ProductImportRepository, ProductImportRepositoryImpl};
use master_code_sync::{ProductImporter, EXTERNAL_SYSTEM};
use rusqlite::params;
use test_helpers::{create_test_db, open_test_connection, write_csv};

const CSV_HEADER: &str = "product_no,product_name,category_ids,price_sale,inventory_track,stock_qty,stock_qty_total,sale_status,display_status,description,option_used,option_name,option_values,thumbnail_url,product_url";

fn build_importer(db_path: &str) -> ProductImporterImpl<ProductImportRepositoryImpl> {
    let repo = ProductImportRepositoryImpl::new(db_path).expect("仓储创建失败");
    ProductImporterImpl::new(
        repo,
        Box::new(UniversalFileParser),
        Box::new(RowValidatorImpl),
        EXTERNAL_SYSTEM.to_string(),
    )
}

#[tokio::test]
async fn test_import_clean_file_end_to_end() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    let csv = format!(
        "{}\n\
         1001,运动水壶 500ml,\"CATE9,CATE44\",12000,Y,30,,SELLING,Y,轻量水壶,N,,,https://cdn.example.com/1001.jpg,https://shop.example.com/p/1001\n\
         1002,折叠雨伞,CATE44,8000,N,,,SELLING,Y,,N,,,,\n\
         1003,保温杯,CATE9,\"15,000\",N,,,,N,,Y,颜色,\"黑色, 白色 , 黑色\",,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);
    let report = importer
        .import_from_file(csv_file.path(), false)
        .await
        .expect("导入执行失败");

    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.skipped_existing, 0);
    assert!(report.errors.is_empty());
    assert!(!report.has_failures());

    let conn = open_test_connection(&db_path).unwrap();

    // 主码按发码类目内顺序分配
    let code_1001: String = conn
        .query_row(
            "SELECT p.master_code FROM product p
             JOIN external_product_map m ON m.product_id = p.product_id
             WHERE m.external_id = '1001'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(code_1001, "CATE9-00001");

    let code_1002: String = conn
        .query_row(
            "SELECT p.master_code FROM product p
             JOIN external_product_map m ON m.product_id = p.product_id
             WHERE m.external_id = '1002'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(code_1002, "CATE44-00001");

    // 选项值按规范形态去重: "黑色, 白色 , 黑色" → 2 个
    let option_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM product_option_value v
             JOIN external_product_map m ON m.product_id = v.product_id
             WHERE m.external_id = '1003'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(option_count, 2);

    // 批次运行已持久化
    let batch_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_batch", [], |row| row.get(0))
        .unwrap();
    assert_eq!(batch_count, 1);

    // 读路径: 按主码读回完整商品
    let repo = ProductImportRepositoryImpl::new(&db_path).unwrap();
    let product = repo
        .find_product_by_master_code("CATE9-00001")
        .await
        .unwrap()
        .expect("商品应可按主码读回");
    assert_eq!(product.name, "运动水壶 500ml");
    assert_eq!(
        product.category_ids,
        vec!["CATE9".to_string(), "CATE44".to_string()]
    );
    assert!(product.inventory_track);
    assert_eq!(product.stock_qty, Some(30));
    let images = repo.list_images(&product.product_id).await.unwrap();
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn test_import_partial_failure_continues_past_bad_rows() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    // 第 3 行缺商品名，第 4 行价格非法，第 5 行正常
    let csv = format!(
        "{}\n\
         2001,商品A,CATE9,1000,N,,,,Y,,N,,,,\n\
         2002,,CATE9,1000,N,,,,Y,,N,,,,\n\
         2003,商品C,CATE9,-50,N,,,,Y,,N,,,,\n\
         2004,商品D,CATE9,1000,N,,,,Y,,N,,,,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);
    let report = importer
        .import_from_file(csv_file.path(), false)
        .await
        .expect("导入执行失败");

    assert_eq!(report.status, BatchStatus::Partial);
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.processed, 2);
    assert_eq!(report.errors.len(), 2);
    assert!(report.has_failures());

    // 报告行号 1 起算含表头: 首个数据行为 2
    assert_eq!(report.errors[0].row_number, 3);
    assert_eq!(report.errors[0].code, RowErrorCode::ProductName);
    assert_eq!(report.errors[1].row_number, 4);
    assert_eq!(report.errors[1].code, RowErrorCode::Price);

    // 失败行不落库，成功行的发码连续（失败行不消耗序号）
    let conn = open_test_connection(&db_path).unwrap();
    let codes: Vec<String> = conn
        .prepare("SELECT master_code FROM product ORDER BY master_code")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(codes, vec!["CATE9-00001", "CATE9-00002"]);
}

#[tokio::test]
async fn test_reimport_rejects_then_skips_with_allow_existing() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    let csv = format!(
        "{}\n3001,商品A,CATE9,1000,N,,,,Y,,N,,,,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);

    let first = importer
        .import_from_file(csv_file.path(), false)
        .await
        .unwrap();
    assert_eq!(first.status, BatchStatus::Success);

    // 默认策略: 已建档的外部商品再次出现是行级错误
    let second = importer
        .import_from_file(csv_file.path(), false)
        .await
        .unwrap();
    assert_eq!(second.status, BatchStatus::Partial);
    assert_eq!(second.errors.len(), 1);
    assert_eq!(second.errors[0].code, RowErrorCode::Exists);

    // --allow-existing: 跳过且不消耗序号
    let third = importer
        .import_from_file(csv_file.path(), true)
        .await
        .unwrap();
    assert_eq!(third.status, BatchStatus::Success);
    assert_eq!(third.skipped_existing, 1);
    assert_eq!(third.processed, 0);

    let conn = open_test_connection(&db_path).unwrap();
    let last_seq: i64 = conn
        .query_row(
            "SELECT last_seq FROM code_sequence WHERE issued_category_id = 'CATE9'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(last_seq, 1);
}

#[tokio::test]
async fn test_inventory_mismatch_row_leaves_no_side_effects() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    // 库存跟踪 N 却带库存数量: 信号冲突，行级硬失败
    let csv = format!(
        "{}\n4001,商品A,CATE9,1000,N,25,,,Y,,N,,,,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);
    let report = importer
        .import_from_file(csv_file.path(), false)
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Partial);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, RowErrorCode::InventoryMismatch);

    // 零副作用: 无商品、无映射、无序号消耗
    let conn = open_test_connection(&db_path).unwrap();
    for (table, expected) in [("product", 0i64), ("external_product_map", 0), ("code_sequence", 0)] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, expected, "表 {} 应为空", table);
    }
}

#[tokio::test]
async fn test_option_name_missing_warns_but_creates_product() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    // option_used=Y 但选项名缺失: 警告 + 跳过选项块，商品照常建档
    let csv = format!(
        "{}\n5001,商品A,CATE9,1000,N,,,,Y,,Y,,\"红色,蓝色\",,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);
    let report = importer
        .import_from_file(csv_file.path(), false)
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.processed, 1);
    assert_eq!(report.warnings.len(), 1);

    let conn = open_test_connection(&db_path).unwrap();
    let (product_count, option_count): (i64, i64) = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM product), (SELECT COUNT(*) FROM product_option_value)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(product_count, 1);
    assert_eq!(option_count, 0);
}

#[tokio::test]
async fn test_missing_file_is_top_level_failure() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    let importer = build_importer(&db_path);
    let result = importer
        .import_from_file("/nonexistent/products.csv", false)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_thumbnail_url_persisted_as_image() {
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");

    let csv = format!(
        "{}\n6001,商品A,CATE9,1000,N,,,,Y,,N,,,https://cdn.example.com/6001.jpg,\n",
        CSV_HEADER
    );
    let csv_file = write_csv(&csv).expect("Failed to write csv");

    let importer = build_importer(&db_path);
    let report = importer
        .import_from_file(csv_file.path(), false)
        .await
        .unwrap();
    assert_eq!(report.status, BatchStatus::Success);

    let conn = open_test_connection(&db_path).unwrap();
    let (kind, url): (String, String) = conn
        .query_row(
            "SELECT kind, url FROM product_image LIMIT 1",
            params![],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(kind, "THUMBNAIL");
    assert_eq!(url, "https://cdn.example.com/6001.jpg");
}
