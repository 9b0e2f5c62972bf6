// ==========================================
// 主产品档案导入集成测试
// ==========================================
// 测试范围:
// 1. CSV 全流程导入 (解析 → 映射 → 清洗 → DQ → 落库)
// 2. Error 行阻断 / Warning 行放行
// 3. 批次审计记录
// 4. 重复导入的 upsert 语义
// ==========================================

mod test_helpers;

use paint_formulation::domain::types::Subcategory;
use paint_formulation::importer::MasterProductImporter;
use paint_formulation::repository::MasterProductRepository;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::Builder;

// ==========================================
// 辅助函数
// ==========================================

fn setup() -> (
    tempfile::NamedTempFile,
    Arc<Mutex<rusqlite::Connection>>,
    MasterProductImporter,
) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_test_connection(&db_path).expect("打开数据库失败");
    let conn = test_helpers::shared_connection(conn);
    let importer = MasterProductImporter::new(conn.clone());
    (temp_file, conn, importer)
}

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// ==========================================
// 全流程导入
// ==========================================

#[tokio::test]
async fn test_csv_import_end_to_end() {
    let (_tmp, conn, importer) = setup();

    let csv = write_csv(
        "产品编号,产品名称,密度,固含量,固体密度,子类别,允许重复添加,采购单价\n\
         RM-001,环氧树脂,1.12,55,1.25,树脂,0,18\n\
         RM-002,钛白粉,4.1,,,颜填料,N,22\n\
         RM-003,二甲苯,0.87,,,,Y,6\n",
    );

    let outcome = importer
        .import_from_file(csv.path(), Some("tester"))
        .await
        .expect("导入失败");

    assert_eq!(outcome.summary.total_rows, 3);
    assert_eq!(outcome.summary.success, 3);
    assert_eq!(outcome.summary.blocked, 0);

    // 档案落库 + 子类别归一
    let repo = MasterProductRepository::from_connection(conn.clone());
    let resin = repo.find_by_id("RM-001").unwrap().expect("RM-001 应存在");
    assert_eq!(resin.master_product_name, "环氧树脂");
    assert_eq!(resin.subcategory, Subcategory::Resin);
    assert_eq!(resin.density, Some(1.12));
    assert_eq!(resin.solid_density, Some(1.25));
    assert!(!resin.can_repeat);

    let tio2 = repo.find_by_id("RM-002").unwrap().expect("RM-002 应存在");
    assert_eq!(tio2.subcategory, Subcategory::Extender);
    assert_eq!(tio2.solids_pct, None);

    let solvent = repo.find_by_id("RM-003").unwrap().expect("RM-003 应存在");
    assert_eq!(solvent.subcategory, Subcategory::General, "空子类别归通用类");
    assert!(solvent.can_repeat, "Y 标志应解析为可重复");
}

#[tokio::test]
async fn test_error_rows_blocked_warning_rows_pass() {
    let (_tmp, conn, importer) = setup();

    let csv = write_csv(
        "产品编号,产品名称,密度,采购单价\n\
         ,缺编号材料,1.2,10\n\
         RM-010,缺密度材料,,12\n\
         RM-011,正常材料,1.5,15\n",
    );

    let outcome = importer
        .import_from_file(csv.path(), None)
        .await
        .expect("导入失败");

    // 行1 主键缺失阻断; 行2 密度缺失仅警告; 行3 正常
    assert_eq!(outcome.summary.total_rows, 3);
    assert_eq!(outcome.summary.success, 2);
    assert_eq!(outcome.summary.blocked, 1);
    assert_eq!(outcome.summary.warning, 1);

    let repo = MasterProductRepository::from_connection(conn.clone());
    assert!(repo.find_by_id("RM-010").unwrap().is_some(), "警告行应放行");
    assert_eq!(repo.list_all().unwrap().len(), 2);

    // 违规明细含行号与字段
    assert!(outcome
        .violations
        .iter()
        .any(|v| v.row_number == 1 && v.field == "master_product_id"));
    assert!(outcome
        .violations
        .iter()
        .any(|v| v.row_number == 2 && v.field == "density"));
}

#[tokio::test]
async fn test_import_batch_audit_recorded() {
    let (_tmp, conn, importer) = setup();

    let csv = write_csv("产品编号,产品名称\nRM-020,助剂A\n");
    let outcome = importer
        .import_from_file(csv.path(), Some("tester"))
        .await
        .expect("导入失败");

    let conn = conn.lock().unwrap();
    let (imported_by, success_rows): (Option<String>, i32) = conn
        .query_row(
            "SELECT imported_by, success_rows FROM import_batch WHERE batch_id = ?1",
            rusqlite::params![outcome.batch.batch_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("批次记录应存在");

    assert_eq!(imported_by.as_deref(), Some("tester"));
    assert_eq!(success_rows, 1);
}

#[tokio::test]
async fn test_reimport_upserts_existing_products() {
    let (_tmp, conn, importer) = setup();

    let first = write_csv("产品编号,产品名称,密度\nRM-030,旧名称,1.0\n");
    importer
        .import_from_file(first.path(), None)
        .await
        .expect("首次导入失败");

    let second = write_csv("产品编号,产品名称,密度\nRM-030,新名称,1.3\n");
    importer
        .import_from_file(second.path(), None)
        .await
        .expect("再次导入失败");

    let repo = MasterProductRepository::from_connection(conn.clone());
    let product = repo.find_by_id("RM-030").unwrap().unwrap();
    assert_eq!(product.master_product_name, "新名称", "重复导入应覆盖");
    assert_eq!(product.density, Some(1.3));
    assert_eq!(repo.list_all().unwrap().len(), 1, "不应产生重复档案");
}

#[tokio::test]
async fn test_missing_file_fails_without_partial_write() {
    let (_tmp, conn, importer) = setup();

    let result = importer
        .import_from_file("/nonexistent/products.csv", None)
        .await;
    assert!(result.is_err());

    // 文件级失败不产生批次记录
    let conn = conn.lock().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_batch", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
