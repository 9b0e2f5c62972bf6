// ==========================================
// 涂料配方开发系统 - 缺省物性策略
// ==========================================
// 红线: 缺省值只允许出现在本模块, 计算代码不得内联回退字面量
// 口径:
// - 密度缺失/非正 → 1
// - 固含缺失 → 0 (视为溶剂); 仅 PVC 分母的树脂按 100
// - 固体密度缺失 → 回退密度
// - CPVC: 存在颜填料时取经验常数 52, 否则 0 (领域启发式, 非计算量)
// ==========================================

use crate::domain::material::RawMaterial;
use crate::domain::types::Subcategory;

/// 密度缺省值 (g/cm³)
pub const DEFAULT_DENSITY: f64 = 1.0;

/// 通用固含缺省值 (%) — 未知材料按溶剂处理
pub const DEFAULT_SOLIDS_PCT: f64 = 0.0;

/// 树脂在 PVC 分母中的固含缺省值 (%)
pub const RESIN_DEFAULT_SOLIDS_PCT: f64 = 100.0;

/// 含颜填料配方的临界颜料体积浓度经验常数 (%)
pub const CPVC_WITH_EXTENDER: f64 = 52.0;

/// 有效密度: 密度缺失或非正时回退 1
pub fn effective_density(material: &RawMaterial) -> f64 {
    match material.density {
        Some(d) if d > 0.0 => d,
        _ => DEFAULT_DENSITY,
    }
}

/// 有效固含 (%): 缺失按溶剂处理
pub fn effective_solids(material: &RawMaterial) -> f64 {
    material.solids_pct.unwrap_or(DEFAULT_SOLIDS_PCT)
}

/// 固体体积口径的有效密度:
/// 树脂且固体密度有值时用固体密度, 否则回退有效密度
pub fn effective_solid_density(material: &RawMaterial) -> f64 {
    if material.subcategory == Subcategory::Resin {
        if let Some(sd) = material.solid_density {
            if sd > 0.0 {
                return sd;
            }
        }
    }
    effective_density(material)
}

/// PVC 分母口径的树脂固含 (%): 缺失按 100 (纯树脂), 不按 0
pub fn binder_solids(material: &RawMaterial) -> f64 {
    material.solids_pct.unwrap_or(RESIN_DEFAULT_SOLIDS_PCT)
}

/// PVC 分母口径的树脂固体密度: 缺失回退密度
pub fn binder_solid_density(material: &RawMaterial) -> f64 {
    match material.solid_density {
        Some(sd) if sd > 0.0 => sd,
        _ => effective_density(material),
    }
}

/// 升料重口径的有效密度 (Wt/Ltr = total_percentage / 此值)
pub fn effective_wt_density(material: &RawMaterial) -> f64 {
    effective_density(material)
}

/// 防除零比值: 分母为 0 时返回 0, 不产出 NaN/Inf
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(subcategory: Subcategory) -> RawMaterial {
        let mut m = RawMaterial::minimal("RM-T", "测试材料");
        m.subcategory = subcategory;
        m
    }

    #[test]
    fn test_effective_density_defaults_to_one() {
        let mut m = material(Subcategory::General);
        assert_eq!(effective_density(&m), 1.0, "缺失密度应回退 1");

        m.density = Some(0.0);
        assert_eq!(effective_density(&m), 1.0, "非正密度应回退 1");

        m.density = Some(1.45);
        assert_eq!(effective_density(&m), 1.45);
    }

    #[test]
    fn test_solid_density_only_for_resin() {
        let mut resin = material(Subcategory::Resin);
        resin.density = Some(1.1);
        resin.solid_density = Some(1.3);
        assert_eq!(effective_solid_density(&resin), 1.3, "树脂应使用固体密度");

        let mut extender = material(Subcategory::Extender);
        extender.density = Some(2.7);
        extender.solid_density = Some(2.9);
        assert_eq!(
            effective_solid_density(&extender),
            2.7,
            "非树脂类固体密度不生效"
        );
    }

    #[test]
    fn test_binder_solids_defaults_to_full() {
        let resin = material(Subcategory::Resin);
        assert_eq!(binder_solids(&resin), 100.0, "树脂缺失固含时按 100 参与 PVC");
        assert_eq!(effective_solids(&resin), 0.0, "通用口径缺失固含按溶剂处理");
    }

    #[test]
    fn test_safe_ratio_never_nan() {
        assert_eq!(safe_ratio(5.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert!((safe_ratio(1.0, 4.0) - 0.25).abs() < 1e-12);
    }
}
