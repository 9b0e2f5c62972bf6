// ==========================================
// 涂料配方开发系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 初始化日志/数据库, 打印系统信息
// (前端表单/路由等 UI 面不在本仓库范围)
// ==========================================

use paint_formulation::db;
use paint_formulation::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", paint_formulation::APP_NAME);
    tracing::info!("系统版本: {}", paint_formulation::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(db::default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    // 打开连接并初始化 schema
    let conn = match db::open_sqlite_connection(&db_path) {
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

    match db::read_schema_version(&conn) {
        Ok(Some(v)) if v == db::CURRENT_SCHEMA_VERSION => {
            tracing::info!("schema 版本: {}", v);
        }
        Ok(v) => {
            tracing::warn!(
                "schema 版本不匹配: 库内={:?}, 期望={}",
                v,
                db::CURRENT_SCHEMA_VERSION
            );
        }
        Err(e) => {
            tracing::warn!("读取 schema 版本失败: {}", e);
        }
    }

    tracing::info!("数据库就绪, 可通过 import_master_products 导入主产品档案");
}
