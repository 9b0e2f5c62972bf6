// ==========================================
// 涂料配方开发系统 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 子类别归一 / 物性合法化
// ==========================================

use crate::domain::material::RawProductRecord;
use crate::domain::types::Subcategory;

pub struct DataCleaner;

impl DataCleaner {
    /// 文本清洗: 去首尾空白, 可选转大写
    pub fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    /// NULL 标准化: 空白字符串归一为 None
    pub fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 子类别归一: 中文/大小写混写统一为枚举值, 未知值归通用类
    pub fn clean_subcategory(&self, value: Option<String>) -> Subcategory {
        let raw = match self.normalize_null(value) {
            Some(v) => self.clean_text(&v, true),
            None => return Subcategory::General,
        };

        // 先试标准值, 再试中文别名
        if let Ok(sub) = raw.parse::<Subcategory>() {
            return sub;
        }
        match raw.as_str() {
            "树脂" => Subcategory::Resin,
            "颜填料" | "填料" | "颜料" => Subcategory::Extender,
            "固化剂" => Subcategory::Hardener,
            "主漆" => Subcategory::Base,
            _ => Subcategory::General,
        }
    }

    /// 物性合法化: 非正密度/固体密度归 None (由 policy 层给缺省),
    /// 负吸油量归 None, 固含裁剪到 [0,100]
    pub fn clean_record(&self, record: &mut RawProductRecord) {
        record.master_product_id = self.normalize_null(record.master_product_id.take());
        record.master_product_name = self.normalize_null(record.master_product_name.take());

        if let Some(d) = record.density {
            if d <= 0.0 {
                record.density = None;
            }
        }
        if let Some(sd) = record.solid_density {
            if sd <= 0.0 {
                record.solid_density = None;
            }
        }
        if let Some(oa) = record.oil_absorption {
            if oa < 0.0 {
                record.oil_absorption = None;
            }
        }
        if let Some(s) = record.solids_pct {
            record.solids_pct = Some(s.clamp(0.0, 100.0));
        }
        if let Some(c) = record.purchase_cost {
            if c < 0.0 {
                record.purchase_cost = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  hello  ", false), "hello");
        assert_eq!(cleaner.clean_text("  resin  ", true), "RESIN");
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ".to_string())), None);
        assert_eq!(cleaner.normalize_null(Some("".to_string())), None);
        assert_eq!(
            cleaner.normalize_null(Some("  value  ".to_string())),
            Some("value".to_string())
        );
    }

    #[test]
    fn test_clean_subcategory_aliases() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.clean_subcategory(Some("树脂".to_string())),
            Subcategory::Resin
        );
        assert_eq!(
            cleaner.clean_subcategory(Some("颜填料".to_string())),
            Subcategory::Extender
        );
        assert_eq!(
            cleaner.clean_subcategory(Some("resin".to_string())),
            Subcategory::Resin
        );
        // 未知值与空值归通用类
        assert_eq!(
            cleaner.clean_subcategory(Some("未知分类".to_string())),
            Subcategory::General
        );
        assert_eq!(cleaner.clean_subcategory(None), Subcategory::General);
    }

    #[test]
    fn test_clean_record_normalizes_physics() {
        let cleaner = DataCleaner;
        let mut record = RawProductRecord {
            master_product_id: Some(" RM-001 ".to_string()),
            master_product_name: Some("".to_string()),
            density: Some(-1.0),
            solids_pct: Some(130.0),
            solid_density: Some(0.0),
            oil_absorption: Some(-3.0),
            subcategory: None,
            can_repeat: None,
            purchase_cost: Some(-5.0),
            row_number: 1,
        };

        cleaner.clean_record(&mut record);

        assert_eq!(record.master_product_id.as_deref(), Some("RM-001"));
        assert_eq!(record.master_product_name, None, "空名称归 None");
        assert_eq!(record.density, None, "非正密度归 None");
        assert_eq!(record.solids_pct, Some(100.0), "固含裁剪到 100");
        assert_eq!(record.solid_density, None);
        assert_eq!(record.oil_absorption, None);
        assert_eq!(record.purchase_cost, None, "负单价归 None");
    }
}
