// ==========================================
// 涂料配方开发系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 单 crate 系统: 建表语句集中在 init_schema，不走外部迁移工具
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 缺省数据库路径: <系统数据目录>/paint-formulation/formulation.db
/// (数据目录不可用时回退当前目录)
pub fn default_db_path() -> String {
    let mut dir = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    dir.push("paint-formulation");
    let _ = std::fs::create_dir_all(&dir);
    dir.push("formulation.db");
    dir.to_string_lossy().to_string()
}

/// 初始化数据库 schema（幂等）
///
/// 表清单:
/// - schema_version: 版本提示
/// - config_scope / config_kv: 配置层
/// - master_product: 主产品档案（原材料 + 成品，导入层写入，引擎层只读）
/// - recipe_snapshot / recipe_item: 配方快照（保存即新快照，旧快照只被取代不删除）
/// - bom_item: BOM 标准配方（无保存配方时的回退来源）
/// - import_batch: 导入批次审计
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS master_product (
            master_product_id TEXT PRIMARY KEY,
            master_product_name TEXT NOT NULL,
            density REAL,
            solids_pct REAL,
            solid_density REAL,
            oil_absorption REAL,
            subcategory TEXT NOT NULL DEFAULT 'GENERAL',
            can_repeat INTEGER NOT NULL DEFAULT 0,
            purchase_cost REAL,
            hardener_product_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_snapshot (
            snapshot_id TEXT PRIMARY KEY,
            master_product_id TEXT NOT NULL REFERENCES master_product(master_product_id),
            density REAL NOT NULL DEFAULT 0,
            viscosity REAL,
            water_pct REAL,
            mixing_ratio_part REAL,
            status TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0,
            created_by TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_snapshot_current
            ON recipe_snapshot(master_product_id, is_current);

        CREATE TABLE IF NOT EXISTS recipe_item (
            snapshot_id TEXT NOT NULL REFERENCES recipe_snapshot(snapshot_id) ON DELETE CASCADE,
            material_id TEXT NOT NULL,
            percentage REAL NOT NULL DEFAULT 0,
            total_percentage REAL NOT NULL DEFAULT 0,
            wt_in_ltr REAL NOT NULL DEFAULT 0,
            sequence INTEGER NOT NULL,
            waiting_time_min INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (snapshot_id, sequence)
        );

        CREATE TABLE IF NOT EXISTS bom_item (
            master_product_id TEXT NOT NULL,
            raw_material_id TEXT NOT NULL,
            percentage_required REAL NOT NULL,
            sequence INTEGER,
            waiting_time_min INTEGER,
            PRIMARY KEY (master_product_id, raw_material_id)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT,
            file_path TEXT,
            total_rows INTEGER NOT NULL,
            success_rows INTEGER NOT NULL,
            blocked_rows INTEGER NOT NULL,
            warning_rows INTEGER NOT NULL,
            imported_at TEXT,
            imported_by TEXT,
            elapsed_ms INTEGER,
            dq_report_json TEXT
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        // 再次执行不应报错
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(1));
    }
}
