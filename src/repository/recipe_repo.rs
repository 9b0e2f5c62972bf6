// ==========================================
// 涂料配方开发系统 - 配方快照仓储
// ==========================================
// 职责: 管理 recipe_snapshot / recipe_item 表
// 红线: 保存即新快照, 旧快照 is_current 清零但不删除;
//       同一事务内写入快照头与明细, 不存在半写入状态
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::formulation::{RecipeLineItem, RecipeSnapshot};
use crate::domain::types::RecipeStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// RecipeRepository - 配方快照仓储
// ==========================================
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecipeRepository {
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

    /// 保存配方快照（取代语义）
    ///
    /// 事务内:
    /// 1. 清除该产品现有快照的 is_current
    /// 2. 写入新快照头 (is_current=1)
    /// 3. 写入全部明细行
    pub fn save_snapshot(&self, snapshot: &RecipeSnapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE recipe_snapshot SET is_current = 0 WHERE master_product_id = ?1",
            params![snapshot.master_product_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO recipe_snapshot (
                snapshot_id, master_product_id, density, viscosity, water_pct,
                mixing_ratio_part, status, is_current, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.master_product_id,
                snapshot.density,
                snapshot.viscosity,
                snapshot.water_pct,
                snapshot.mixing_ratio_part,
                snapshot.status.to_string(),
                snapshot.created_by,
                snapshot.created_at.to_rfc3339(),
            ],
        )?;

        for item in &snapshot.items {
            tx.execute(
                r#"
                INSERT INTO recipe_item (
                    snapshot_id, material_id, percentage, total_percentage,
                    wt_in_ltr, sequence, waiting_time_min
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    snapshot.snapshot_id,
                    item.material_id,
                    item.percentage_or_zero(),
                    item.total_percentage_or_zero(),
                    item.wt_per_liter.unwrap_or(0.0),
                    item.sequence,
                    item.waiting_time_min,
                ],
            )?;
        }

        tx.commit()?;
        debug!(
            snapshot_id = %snapshot.snapshot_id,
            product = %snapshot.master_product_id,
            items = snapshot.items.len(),
            "配方快照已保存"
        );
        Ok(())
    }

    /// 查询产品当前生效的配方快照（含明细, 按 sequence 升序）
    pub fn find_current(
        &self,
        master_product_id: &str,
    ) -> RepositoryResult<Option<RecipeSnapshot>> {
        let conn = self.get_conn()?;

        let header = {
            let mut stmt = conn.prepare(
                r#"
                SELECT snapshot_id, master_product_id, density, viscosity, water_pct,
                       mixing_ratio_part, status, created_by, created_at
                FROM recipe_snapshot
                WHERE master_product_id = ?1 AND is_current = 1
                "#,
            )?;

            let result = stmt.query_row(params![master_product_id], |row| {
                let status: String = row.get(6)?;
                let created_at: String = row.get(8)?;
                Ok(RecipeSnapshot {
                    snapshot_id: row.get(0)?,
                    master_product_id: row.get(1)?,
                    density: row.get(2)?,
                    viscosity: row.get(3)?,
                    water_pct: row.get(4)?,
                    mixing_ratio_part: row.get(5)?,
                    status: status
                        .parse::<RecipeStatus>()
                        .unwrap_or(RecipeStatus::Incomplete),
                    items: Vec::new(),
                    created_by: row.get(7)?,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            });

            match result {
                Ok(h) => h,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };

        let mut snapshot = header;
        snapshot.items = Self::load_items(&conn, &snapshot.snapshot_id)?;
        Ok(Some(snapshot))
    }

    /// 查询产品的快照历史条数（含被取代的）
    pub fn count_history(&self, master_product_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_snapshot WHERE master_product_id = ?1",
            params![master_product_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn load_items(conn: &Connection, snapshot_id: &str) -> RepositoryResult<Vec<RecipeLineItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, percentage, total_percentage, wt_in_ltr,
                   sequence, waiting_time_min
            FROM recipe_item
            WHERE snapshot_id = ?1
            ORDER BY sequence
            "#,
        )?;

        let rows = stmt.query_map(params![snapshot_id], |row| {
            Ok(RecipeLineItem {
                material_id: row.get(0)?,
                percentage: Some(row.get(1)?),
                total_percentage: Some(row.get(2)?),
                wt_per_liter: Some(row.get(3)?),
                sequence: row.get(4)?,
                waiting_time_min: row.get(5)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}
