// ==========================================
// 涂料配方开发系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 存储: config_kv 表 (key-value + scope, 当前仅 global scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键全集
// ==========================================
pub mod config_keys {
    /// 配方完整判定容差: |Σpercentage − 100| < 此值 → Completed
    pub const COMPLETENESS_TOLERANCE: &str = "completeness_tolerance";

    /// BOM 小数形式判定阈值: 合计 ≤ 此值时统一 ×100
    pub const BOM_FRACTION_THRESHOLD: &str = "bom_fraction_threshold";

    /// 缺省计划投产量 (kg), 用于百分比→重量换算的初始显示
    pub const DEFAULT_PLANNED_QUANTITY_KG: &str = "default_planned_quantity_kg";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // 类型化读取 (带缺省值)
    // ==========================================

    /// 配方完整判定容差（缺省 0.01）
    pub fn get_completeness_tolerance(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or(config_keys::COMPLETENESS_TOLERANCE, 0.01)
    }

    /// BOM 小数形式判定阈值（缺省 1.05）
    pub fn get_bom_fraction_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or(config_keys::BOM_FRACTION_THRESHOLD, 1.05)
    }

    /// 缺省计划投产量 kg（缺省 1000）
    pub fn get_default_planned_quantity_kg(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or(config_keys::DEFAULT_PLANNED_QUANTITY_KG, 1000.0)
    }

    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default))
    }

    // ==========================================
    // 配置快照
    // ==========================================

    /// 获取所有 global 配置的快照（JSON 格式）
    ///
    /// 用途: 保存配方快照时附带记录当时的计算口径
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}
