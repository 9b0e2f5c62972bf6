// ==========================================
// 涂料配方开发系统 - 数据质量校验器
// ==========================================
// 职责: 行级 DQ 分级 (Error 阻断 / Warning 放行并记录)
// 规则:
// - E1 产品编号缺失 → Error
// - E2 产品名称缺失 → Error
// - W1 密度缺失 → Warning (引擎按 1 计算)
// - W2 树脂类固含缺失 → Warning (PVC 分母按 100 计算)
// - W3 采购单价缺失 → Warning (成本按 0 计算)
// ==========================================

use crate::domain::material::{DqLevel, DqViolation, RawProductRecord};
use crate::domain::types::Subcategory;

pub struct DqValidator;

impl DqValidator {
    /// 单行校验, 返回该行全部违规 (可能同时有多条)
    pub fn validate(
        &self,
        record: &RawProductRecord,
        subcategory: Subcategory,
    ) -> Vec<DqViolation> {
        let mut violations = Vec::new();
        let id = record.master_product_id.clone();

        // E1: 主键缺失
        if record.master_product_id.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                master_product_id: None,
                level: DqLevel::Error,
                field: "master_product_id".to_string(),
                message: "产品编号为空".to_string(),
            });
        }

        // E2: 名称缺失
        if record.master_product_name.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                master_product_id: id.clone(),
                level: DqLevel::Error,
                field: "master_product_name".to_string(),
                message: "产品名称为空".to_string(),
            });
        }

        // W1: 密度缺失
        if record.density.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                master_product_id: id.clone(),
                level: DqLevel::Warning,
                field: "density".to_string(),
                message: "密度缺失, 计算时按 1 处理".to_string(),
            });
        }

        // W2: 树脂类固含缺失
        if subcategory == Subcategory::Resin && record.solids_pct.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                master_product_id: id.clone(),
                level: DqLevel::Warning,
                field: "solids_pct".to_string(),
                message: "树脂固含缺失, PVC 计算时按 100 处理".to_string(),
            });
        }

        // W3: 采购单价缺失
        if record.purchase_cost.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                master_product_id: id,
                level: DqLevel::Warning,
                field: "purchase_cost".to_string(),
                message: "采购单价缺失, 升成本计算时按 0 处理".to_string(),
            });
        }

        violations
    }

    /// 该行是否被阻断 (存在 Error 级违规)
    pub fn is_blocked(violations: &[DqViolation]) -> bool {
        violations.iter().any(|v| v.level == DqLevel::Error)
    }
}
