// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试档案数据等
// ==========================================

use paint_formulation::db;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

/// 创建共享连接句柄（仓储层用）
pub fn shared_connection(conn: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(conn))
}

/// 插入测试配置数据
pub fn insert_test_config(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at) VALUES
        ('global', 'completeness_tolerance', '0.01', datetime('now')),
        ('global', 'bom_fraction_threshold', '1.05', datetime('now')),
        ('global', 'default_planned_quantity_kg', '1000', datetime('now'));
        "#,
    )?;
    Ok(())
}

/// 插入测试主产品档案
///
/// 原材料:
/// - RM-RESIN  树脂, 密度 1.1, 固含 60, 固体密度 1.2, 单价 18
/// - RM-TIO2   颜填料, 密度 4.1, 单价 22
/// - RM-XYL    溶剂(通用), 密度 0.87, 可重复添加, 单价 6
/// - RM-PA650  固化剂, 密度 0.95, 单价 25
/// 成品:
/// - FP-EPOXY  主漆 (关联 FP-CURE)
/// - FP-CURE   固化剂成品
pub fn seed_test_products(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        INSERT OR REPLACE INTO master_product (
            master_product_id, master_product_name, density, solids_pct,
            solid_density, oil_absorption, subcategory, can_repeat,
            purchase_cost, hardener_product_id, created_at, updated_at
        ) VALUES
        ('RM-RESIN', '环氧树脂', 1.1, 60.0, 1.2, NULL, 'RESIN', 0, 18.0, NULL,
         datetime('now'), datetime('now')),
        ('RM-TIO2', '钛白粉', 4.1, NULL, NULL, 18.5, 'EXTENDER', 0, 22.0, NULL,
         datetime('now'), datetime('now')),
        ('RM-XYL', '二甲苯', 0.87, NULL, NULL, NULL, 'GENERAL', 1, 6.0, NULL,
         datetime('now'), datetime('now')),
        ('RM-PA650', '聚酰胺固化剂', 0.95, 50.0, NULL, NULL, 'HARDENER', 0, 25.0, NULL,
         datetime('now'), datetime('now')),
        ('FP-EPOXY', '环氧底漆', NULL, NULL, NULL, NULL, 'BASE', 0, NULL, 'FP-CURE',
         datetime('now'), datetime('now')),
        ('FP-CURE', '环氧底漆固化组分', NULL, NULL, NULL, NULL, 'HARDENER', 0, NULL, NULL,
         datetime('now'), datetime('now'));
        "#,
    )?;
    Ok(())
}

/// 插入测试 BOM (FP-EPOXY, 小数形式占比)
pub fn seed_test_bom(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        INSERT OR REPLACE INTO bom_item (
            master_product_id, raw_material_id, percentage_required, sequence, waiting_time_min
        ) VALUES
        ('FP-EPOXY', 'RM-RESIN', 0.4, 1, 0),
        ('FP-EPOXY', 'RM-TIO2', 0.35, 2, 10),
        ('FP-EPOXY', 'RM-XYL', 0.25, 3, NULL);
        "#,
    )?;
    Ok(())
}
