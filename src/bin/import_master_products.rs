// ==========================================
// 涂料配方开发系统 - 主产品档案导入工具
// ==========================================
// 用法: import_master_products <文件路径> [数据库路径]
// 支持: .csv / .xlsx / .xls
// ==========================================

use paint_formulation::db;
use paint_formulation::importer::MasterProductImporter;
use paint_formulation::logging;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() {
    logging::init();

    let mut args = std::env::args().skip(1);
    let file_path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("用法: import_master_products <文件路径> [数据库路径]");
            std::process::exit(2);
        }
    };
    let db_path = args.next().unwrap_or_else(db::default_db_path);

    tracing::info!("导入文件: {}", file_path);
    tracing::info!("目标数据库: {}", db_path);

    let conn: Connection = match db::open_sqlite_connection(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("数据库连接失败: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::init_schema(&conn) {
        tracing::error!("schema 初始化失败: {}", e);
        std::process::exit(1);
    }

    let importer = MasterProductImporter::new(Arc::new(Mutex::new(conn)));
    match importer.import_from_file(&file_path, Some("cli")).await {
        Ok(outcome) => {
            tracing::info!(
                "导入完成: 总行数={}, 成功={}, 阻断={}, 警告={}",
                outcome.summary.total_rows,
                outcome.summary.success,
                outcome.summary.blocked,
                outcome.summary.warning
            );
            for violation in &outcome.violations {
                tracing::warn!(
                    "行 {}: [{}] {}",
                    violation.row_number,
                    violation.field,
                    violation.message
                );
            }
        }
        Err(e) => {
            tracing::error!("导入失败: {}", e);
            std::process::exit(1);
        }
    }
}
