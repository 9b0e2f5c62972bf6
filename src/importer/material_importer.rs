// ==========================================
// 涂料配方开发系统 - 主产品档案导入器
// ==========================================
// 职责: 整合导入流程, 从文件到数据库
// 流程: 解析 → 映射 → 清洗 → DQ 校验 → 落库 → 批次审计
// 口径: Error 行阻断, Warning 行放行并计入批次统计
// ==========================================

use crate::domain::material::{
    DqLevel, DqSummary, DqViolation, ImportBatch, ImportOutcome, RawMaterial, RawProductRecord,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::dq_validator::DqValidator;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::field_mapper::FieldMapper;
use crate::repository::MasterProductRepository;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// MasterProductImporter - 主产品档案导入器
// ==========================================
pub struct MasterProductImporter {
    conn: Arc<Mutex<Connection>>,
    product_repo: Arc<MasterProductRepository>,
    file_parser: UniversalFileParser,
    field_mapper: FieldMapper,
    data_cleaner: DataCleaner,
    dq_validator: DqValidator,
}

impl MasterProductImporter {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let product_repo = Arc::new(MasterProductRepository::from_connection(conn.clone()));
        Self {
            conn,
            product_repo,
            file_parser: UniversalFileParser,
            field_mapper: FieldMapper,
            data_cleaner: DataCleaner,
            dq_validator: DqValidator,
        }
    }

    /// 从文件导入主产品档案 (.csv/.xlsx/.xls)
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 批次信息 + DQ 汇总 + 违规明细
    /// - Err: 文件级失败 (解析失败等), 不产生任何落库
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        operator: Option<&str>,
    ) -> Result<ImportOutcome, Box<dyn Error>> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let path = file_path.as_ref();
        info!(batch_id = %batch_id, path = %path.display(), "开始导入主产品档案");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let raw_rows = self.file_parser.parse(path)?;
        let total_rows = raw_rows.len();
        info!(total_rows, "文件解析完成");

        // === 步骤 2: 字段映射 ===
        debug!("步骤 2: 字段映射");
        let mut records: Vec<RawProductRecord> = Vec::new();
        let mut violations: Vec<DqViolation> = Vec::new();
        for (idx, row) in raw_rows.into_iter().enumerate() {
            let row_number = idx + 1;
            match self.field_mapper.map_to_raw_product(row, row_number) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row_number, error = %e, "字段映射失败");
                    violations.push(DqViolation {
                        row_number,
                        master_product_id: None,
                        level: DqLevel::Error,
                        field: "-".to_string(),
                        message: format!("字段映射失败: {}", e),
                    });
                }
            }
        }

        // === 步骤 3: 清洗 + DQ 校验 ===
        debug!("步骤 3: 清洗与 DQ 校验");
        let mut materials: Vec<RawMaterial> = Vec::new();
        let mut warning_rows = 0usize;
        for mut record in records {
            self.data_cleaner.clean_record(&mut record);
            let subcategory = self.data_cleaner.clean_subcategory(record.subcategory.clone());

            let row_violations = self.dq_validator.validate(&record, subcategory);
            let blocked = DqValidator::is_blocked(&row_violations);
            if row_violations.iter().any(|v| v.level == DqLevel::Warning) && !blocked {
                warning_rows += 1;
            }
            violations.extend(row_violations);
            if blocked {
                continue;
            }

            let now = Utc::now();
            materials.push(RawMaterial {
                // DQ 已保证主键/名称非空
                master_product_id: record.master_product_id.clone().unwrap_or_default(),
                master_product_name: record.master_product_name.clone().unwrap_or_default(),
                density: record.density,
                solids_pct: record.solids_pct,
                solid_density: record.solid_density,
                oil_absorption: record.oil_absorption,
                subcategory,
                can_repeat: record.can_repeat.unwrap_or(false),
                purchase_cost: record.purchase_cost,
                hardener_product_id: None,
                created_at: now,
                updated_at: now,
            });
        }

        // === 步骤 4: 落库 ===
        debug!("步骤 4: 批量落库");
        let success = self.product_repo.batch_upsert(materials)?;

        // === 步骤 5: 批次审计 ===
        let elapsed_ms = start_time.elapsed().as_millis() as i32;
        let summary = DqSummary {
            total_rows,
            success,
            blocked: total_rows - success,
            warning: warning_rows,
        };
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name: path.file_name().map(|n| n.to_string_lossy().to_string()),
            file_path: Some(path.display().to_string()),
            total_rows: total_rows as i32,
            success_rows: summary.success as i32,
            blocked_rows: summary.blocked as i32,
            warning_rows: summary.warning as i32,
            imported_at: Some(Utc::now()),
            imported_by: operator.map(|s| s.to_string()),
            elapsed_ms: Some(elapsed_ms),
            dq_report_json: Some(serde_json::to_string(&violations)?),
        };
        self.record_batch(&batch)?;

        info!(
            batch_id = %batch_id,
            success = summary.success,
            blocked = summary.blocked,
            warning = summary.warning,
            elapsed_ms,
            "主产品档案导入完成"
        );

        Ok(ImportOutcome {
            batch,
            summary,
            violations,
        })
    }

    /// 写入批次审计记录
    fn record_batch(&self, batch: &ImportBatch) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, file_path, total_rows, success_rows,
                blocked_rows, warning_rows, imported_at, imported_by,
                elapsed_ms, dq_report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.file_path,
                batch.total_rows,
                batch.success_rows,
                batch.blocked_rows,
                batch.warning_rows,
                batch.imported_at.map(|t| t.to_rfc3339()),
                batch.imported_by,
                batch.elapsed_ms,
                batch.dq_report_json,
            ],
        )?;
        Ok(())
    }
}
