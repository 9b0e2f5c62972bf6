// ==========================================
// 涂料配方开发系统 - 字段映射器
// ==========================================
// 职责: 源列名 → 标准字段映射 + 类型转换
// 兼容: 中文表头与英文导出表头（原系统报表）
// ==========================================

use crate::domain::material::RawProductRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapper {
    /// 单行映射: 列名字典 → RawProductRecord
    pub fn map_to_raw_product(
        &self,
        row: HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawProductRecord> {
        Ok(RawProductRecord {
            // 主键
            master_product_id: self.get_string(&row, "产品编号"),

            // 基础信息
            master_product_name: self.get_string(&row, "产品名称"),

            // 物性维度
            density: self.parse_f64(&row, "密度", row_number)?,
            solids_pct: self.parse_f64(&row, "固含量", row_number)?,
            solid_density: self.parse_f64(&row, "固体密度", row_number)?,
            oil_absorption: self.parse_f64(&row, "吸油量", row_number)?,

            // 分类与规则
            subcategory: self.get_string(&row, "子类别"),
            can_repeat: self.parse_bool(&row, "允许重复添加"),

            // 成本
            purchase_cost: self.parse_f64(&row, "采购单价", row_number)?,

            // 元信息
            row_number,
        })
    }

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        // 列名别名映射（中文表头 + 原系统英文导出表头）
        let aliases: Vec<&str> = match key {
            "产品编号" => vec!["产品编号", "MasterProductID", "物料编号"],
            "产品名称" => vec!["产品名称", "MasterProductName", "物料名称"],
            "密度" => vec!["密度", "RMDensity"],
            "固含量" => vec!["固含量", "RMSolids", "固含(%)"],
            "固体密度" => vec!["固体密度", "SolidDensity"],
            "吸油量" => vec!["吸油量", "OilAbsorption"],
            "子类别" => vec!["子类别", "Subcategory"],
            "允许重复添加" => vec!["允许重复添加", "CanBeAddedMultipleTimes"],
            "采购单价" => vec!["采购单价", "PurchaseCost", "单价"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// 解析浮点数
    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value.parse::<f64>().map(Some).map_err(|_| {
                ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }
            }),
        }
    }

    /// 解析布尔标志（1/Y/是/TRUE → true, 其余 → false）
    fn parse_bool(&self, row: &HashMap<String, String>, key: &str) -> Option<bool> {
        self.get_string(row, key).map(|v| {
            matches!(
                v.to_uppercase().as_str(),
                "1" | "Y" | "是" | "TRUE" | "YES"
            )
        })
    }
}
