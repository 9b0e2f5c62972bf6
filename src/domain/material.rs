// ==========================================
// 涂料配方开发系统 - 主产品领域模型
// ==========================================
// 红线: 主产品档案由导入层写入, 引擎层只读
// 缺省策略集中在 engine::policy, 此处只保存原始值
// ==========================================

use crate::domain::types::Subcategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RawMaterial - 主产品档案（原材料视角）
// ==========================================
// 对齐: master_product 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    // ===== 主键 =====
    pub master_product_id: String, // 主产品唯一标识

    // ===== 基础信息 =====
    pub master_product_name: String, // 产品名称

    // ===== 物性维度 =====
    pub density: Option<f64>,        // 密度 (g/cm³, 缺省按 1 处理)
    pub solids_pct: Option<f64>,     // 固含量 (%, 缺省视为溶剂)
    pub solid_density: Option<f64>,  // 固体密度 (仅树脂类使用, 缺省回退密度)
    pub oil_absorption: Option<f64>, // 吸油量 (颜填料属性, 保留字段)

    // ===== 分类与配方规则 =====
    pub subcategory: Subcategory, // 子类别 (决定 PVC 口径)
    pub can_repeat: bool,         // 是否允许在同一配方中重复添加

    // ===== 成本 =====
    pub purchase_cost: Option<f64>, // 采购单价 (元/kg)

    // ===== 双组分关联 =====
    pub hardener_product_id: Option<String>, // 关联固化剂产品 (仅成品主漆使用)

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RawMaterial {
    /// 创建仅含必填字段的档案（测试与缺档回退使用）
    pub fn minimal(id: &str, name: &str) -> Self {
        let now = Utc::now();
        Self {
            master_product_id: id.to_string(),
            master_product_name: name.to_string(),
            density: None,
            solids_pct: None,
            solid_density: None,
            oil_absorption: None,
            subcategory: Subcategory::General,
            can_repeat: false,
            purchase_cost: None,
            hardener_product_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// MaterialCatalog - 原材料目录
// ==========================================
// 用途: 引擎层按 id 查物性; 目录缺档不报错, 由 policy 层给缺省值
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    by_id: HashMap<String, RawMaterial>,
}

impl MaterialCatalog {
    pub fn new(materials: Vec<RawMaterial>) -> Self {
        let by_id = materials
            .into_iter()
            .map(|m| (m.master_product_id.clone(), m))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, material_id: &str) -> Option<&RawMaterial> {
        self.by_id.get(material_id)
    }

    pub fn contains(&self, material_id: &str) -> bool {
        self.by_id.contains_key(material_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// 追加或替换一条档案（导入后增量刷新目录）
    pub fn upsert(&mut self, material: RawMaterial) {
        self.by_id
            .insert(material.master_product_id.clone(), material);
    }
}

// ==========================================
// RawProductRecord - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProductRecord {
    // 源字段（已类型转换）
    pub master_product_id: Option<String>,
    pub master_product_name: Option<String>,
    pub density: Option<f64>,
    pub solids_pct: Option<f64>,
    pub solid_density: Option<f64>,
    pub oil_absorption: Option<f64>,
    pub subcategory: Option<String>,
    pub can_repeat: Option<bool>,
    pub purchase_cost: Option<f64>,

    // 元信息
    pub row_number: usize, // 原始文件行号（用于 DQ 报告）
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String, // 批次 ID（UUID）
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub total_rows: i32,
    pub success_rows: i32,   // 成功导入行数
    pub blocked_rows: i32,   // 阻断行数（DQ ERROR）
    pub warning_rows: i32,   // 警告行数（DQ WARNING）
    pub imported_at: Option<DateTime<Utc>>,
    pub imported_by: Option<String>,
    pub elapsed_ms: Option<i32>,
    pub dq_report_json: Option<String>,
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DqLevel {
    Error,   // 错误（阻断该行导入）
    Warning, // 警告（允许导入）
    Info,    // 提示（仅记录）
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,
    pub master_product_id: Option<String>, // 产品编号（如果可解析）
    pub level: DqLevel,
    pub field: String,
    pub message: String,
}

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize,
    pub success: usize,
    pub blocked: usize,
    pub warning: usize,
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// 用途: 导入接口返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch: ImportBatch,
    pub summary: DqSummary,
    pub violations: Vec<DqViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup_by_id() {
        let catalog = MaterialCatalog::new(vec![
            RawMaterial::minimal("RM-A", "材料A"),
            RawMaterial::minimal("RM-B", "材料B"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("RM-A"));
        assert!(!catalog.contains("RM-C"));
        assert_eq!(catalog.get("RM-B").unwrap().master_product_name, "材料B");
    }

    #[test]
    fn test_catalog_upsert_replaces_record() {
        let mut catalog = MaterialCatalog::default();
        assert!(catalog.is_empty());

        catalog.upsert(RawMaterial::minimal("RM-A", "旧名称"));
        let mut updated = RawMaterial::minimal("RM-A", "新名称");
        updated.density = Some(1.3);
        catalog.upsert(updated);

        assert_eq!(catalog.len(), 1, "同 id 覆盖不新增");
        assert_eq!(catalog.get("RM-A").unwrap().master_product_name, "新名称");
    }
}
