// ==========================================
// 涂料配方开发系统 - 主产品档案仓储
// ==========================================
// 职责: 管理 master_product 表的 CRUD 操作
// 红线: 不含业务逻辑, 只负责数据访问; 档案由导入层写入, 引擎层只读
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::{MaterialCatalog, RawMaterial};
use crate::domain::types::Subcategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// MasterProductRepository - 主产品档案仓储
// ==========================================
pub struct MasterProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MasterProductRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入主产品档案（INSERT OR REPLACE, upsert 语义）
    ///
    /// # 返回
    /// - Ok(usize): 成功写入的记录数
    ///
    /// # 说明
    /// - master_product_id 已存在时更新记录
    /// - 使用事务确保原子性
    pub fn batch_upsert(&self, materials: Vec<RawMaterial>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for material in materials {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO master_product (
                    master_product_id, master_product_name,
                    density, solids_pct, solid_density, oil_absorption,
                    subcategory, can_repeat, purchase_cost, hardener_product_id,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    material.master_product_id,
                    material.master_product_name,
                    material.density,
                    material.solids_pct,
                    material.solid_density,
                    material.oil_absorption,
                    material.subcategory.to_string(),
                    material.can_repeat as i32,
                    material.purchase_cost,
                    material.hardener_product_id,
                    material.created_at.to_rfc3339(),
                    material.updated_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 按 id 查询主产品档案
    pub fn find_by_id(&self, master_product_id: &str) -> RepositoryResult<Option<RawMaterial>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE master_product_id = ?1",
            Self::SELECT_COLUMNS
        ))?;

        let result = stmt.query_row(params![master_product_id], Self::map_row);
        match result {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部档案（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<RawMaterial>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY master_product_name",
            Self::SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([], Self::map_row)?;
        let mut materials = Vec::new();
        for row in rows {
            materials.push(row?);
        }
        Ok(materials)
    }

    /// 加载原材料目录（引擎层查物性用）
    pub fn load_catalog(&self) -> RepositoryResult<MaterialCatalog> {
        Ok(MaterialCatalog::new(self.list_all()?))
    }

    /// 更新主漆档案的固化剂关联（双组分保存的最后一步）
    pub fn update_hardener_link(
        &self,
        base_product_id: &str,
        hardener_product_id: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE master_product
            SET hardener_product_id = ?2, updated_at = ?3
            WHERE master_product_id = ?1
            "#,
            params![
                base_product_id,
                hardener_product_id,
                Utc::now().to_rfc3339()
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MasterProduct".to_string(),
                id: base_product_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 行映射
    // ==========================================

    const SELECT_COLUMNS: &'static str = r#"
        SELECT
            master_product_id, master_product_name,
            density, solids_pct, solid_density, oil_absorption,
            subcategory, can_repeat, purchase_cost, hardener_product_id,
            created_at, updated_at
        FROM master_product
    "#;

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawMaterial> {
        let subcategory: String = row.get(6)?;
        Ok(RawMaterial {
            master_product_id: row.get(0)?,
            master_product_name: row.get(1)?,
            density: row.get(2)?,
            solids_pct: row.get(3)?,
            solid_density: row.get(4)?,
            oil_absorption: row.get(5)?,
            // 历史数据可能存在未知子类别, 按通用类兜底
            subcategory: subcategory.parse::<Subcategory>().unwrap_or_default(),
            can_repeat: row.get::<_, i32>(7)? != 0,
            purchase_cost: row.get(8)?,
            hardener_product_id: row.get(9)?,
            created_at: Self::parse_ts(row.get::<_, String>(10)?),
            updated_at: Self::parse_ts(row.get::<_, String>(11)?),
        })
    }

    fn parse_ts(raw: String) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}
