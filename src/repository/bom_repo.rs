// ==========================================
// 涂料配方开发系统 - BOM 仓储
// ==========================================
// 职责: 管理 bom_item 表; 对引擎层以 BomSource trait 暴露
// (依赖倒置: API 层只依赖 trait, 便于测试替身)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::formulation::BomLine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// Trait: BomSource
// ==========================================
/// BOM 回退来源接口
#[async_trait]
pub trait BomSource: Send + Sync {
    /// 查询产品的 BOM 标准配方行（可能为空）
    async fn fetch_bom(&self, master_product_id: &str) -> RepositoryResult<Vec<BomLine>>;
}

// ==========================================
// BomRepository - BOM 仓储
// ==========================================
pub struct BomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BomRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按产品查询 BOM 行（按 sequence 升序, 缺失 sequence 的行排最后）
    pub fn find_by_product(&self, master_product_id: &str) -> RepositoryResult<Vec<BomLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT raw_material_id, percentage_required, sequence, waiting_time_min
            FROM bom_item
            WHERE master_product_id = ?1
            ORDER BY sequence IS NULL, sequence
            "#,
        )?;

        let rows = stmt.query_map(params![master_product_id], |row| {
            Ok(BomLine {
                raw_material_id: row.get(0)?,
                percentage_required: row.get(1)?,
                sequence: row.get(2)?,
                waiting_time_min: row.get(3)?,
            })
        })?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    /// 批量写入 BOM 行（种子数据/测试用）
    pub fn insert_lines(
        &self,
        master_product_id: &str,
        lines: &[BomLine],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for line in lines {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO bom_item (
                    master_product_id, raw_material_id, percentage_required,
                    sequence, waiting_time_min
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    master_product_id,
                    line.raw_material_id,
                    line.percentage_required,
                    line.sequence,
                    line.waiting_time_min,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}

#[async_trait]
impl BomSource for BomRepository {
    async fn fetch_bom(&self, master_product_id: &str) -> RepositoryResult<Vec<BomLine>> {
        self.find_by_product(master_product_id)
    }
}
