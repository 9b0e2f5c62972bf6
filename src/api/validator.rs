// ==========================================
// 涂料配方开发系统 - 配方保存校验器
// ==========================================
// 职责: 保存前置校验 (占比完整性 + 双组分约束)
// 规则:
// - V1 主漆配方为空 → 拒绝
// - V2 任一主漆行 total_percentage == 0 (未录入按 0) → 拒绝
// - V3 占比超出 [0,100] → 拒绝
// - V4 已关联固化剂且期望固化剂毛合计 > 0 时:
//      固化剂至少 1 行, 且无 total_percentage == 0 的行
// ==========================================

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::formulation::{Formulation, TwoPartSystem};
use crate::domain::types::RecipeStatus;

// ==========================================
// SaveValidator - 配方保存校验器
// ==========================================
pub struct SaveValidator {
    /// 完整判定容差: |Σpercentage − 100| < 此值 → Completed
    completeness_tolerance: f64,
}

impl SaveValidator {
    pub fn new(completeness_tolerance: f64) -> Self {
        Self {
            completeness_tolerance,
        }
    }

    /// 保存前置校验, 任一违规即拒绝 (附逐条原因)
    pub fn validate_for_save(&self, system: &TwoPartSystem) -> ApiResult<()> {
        let mut violations = Vec::new();

        // V1: 主漆配方为空
        if system.base.items.is_empty() {
            violations.push(ValidationViolation {
                violation_type: "EMPTY_RECIPE".to_string(),
                material_id: None,
                reason: "主漆配方没有任何配方行".to_string(),
            });
        }

        // V2/V3: 主漆逐行检查
        for item in &system.base.items {
            if item.total_percentage_or_zero() == 0.0 {
                violations.push(ValidationViolation {
                    violation_type: "BASE_TOTAL_ZERO".to_string(),
                    material_id: Some(item.material_id.clone()),
                    reason: format!("主漆行毛批次占比为 0: {}", item.material_id),
                });
            }
            Self::check_range(&mut violations, item.percentage_or_zero(), &item.material_id);
            Self::check_range(
                &mut violations,
                item.total_percentage_or_zero(),
                &item.material_id,
            );
        }

        // V4: 固化剂约束 (仅当期望毛合计 > 0 时要求固化剂完整)
        if let Some(hardener) = &system.hardener {
            let expected_total = system.expected_hardener_total();
            if expected_total > 0.0 {
                if hardener.items.is_empty() {
                    violations.push(ValidationViolation {
                        violation_type: "HARDENER_MISSING".to_string(),
                        material_id: None,
                        reason: format!(
                            "固化剂应占毛批次 {:.2}% 但没有任何配方行",
                            expected_total
                        ),
                    });
                }
                for item in &hardener.items {
                    if item.total_percentage_or_zero() == 0.0 {
                        violations.push(ValidationViolation {
                            violation_type: "HARDENER_TOTAL_ZERO".to_string(),
                            material_id: Some(item.material_id.clone()),
                            reason: format!("固化剂行毛批次占比为 0: {}", item.material_id),
                        });
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::SaveValidationError {
                reason: format!("共 {} 条校验违规", violations.len()),
                violations,
            })
        }
    }

    /// 完整性判定: |Σpercentage − 100| < 容差 → Completed
    pub fn compute_status(&self, formulation: &Formulation) -> RecipeStatus {
        if (formulation.percentage_sum() - 100.0).abs() < self.completeness_tolerance {
            RecipeStatus::Completed
        } else {
            RecipeStatus::Incomplete
        }
    }

    fn check_range(violations: &mut Vec<ValidationViolation>, value: f64, material_id: &str) {
        if !(0.0..=100.0).contains(&value) {
            violations.push(ValidationViolation {
                violation_type: "PERCENTAGE_RANGE".to_string(),
                material_id: Some(material_id.to_string()),
                reason: format!("占比超出范围 [0,100]: {} ({})", value, material_id),
            });
        }
    }
}
