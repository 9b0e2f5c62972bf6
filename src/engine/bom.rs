// ==========================================
// 涂料配方开发系统 - BOM 回退配方构建
// ==========================================
// 职责: 无保存配方时, 用 BOM 标准配方构建初始配方
// 口径: BOM 占比可能以小数形式录入 (0.4 表示 40%);
//       合计 ≤ 阈值 (缺省 1.05) 时统一 ×100 归一化, 否则原样使用
// ==========================================

use crate::domain::formulation::{BomLine, Formulation, RecipeLineItem};
use tracing::debug;

/// 小数形式判定阈值: 合计 ≤ 此值视为小数录入
pub const DEFAULT_FRACTION_THRESHOLD: f64 = 1.05;

// ==========================================
// BomNormalizer - BOM 归一化器
// ==========================================
pub struct BomNormalizer {
    fraction_threshold: f64,
}

impl BomNormalizer {
    pub fn new() -> Self {
        Self {
            fraction_threshold: DEFAULT_FRACTION_THRESHOLD,
        }
    }

    /// 使用配置中的阈值 (config_kv: bom_fraction_threshold)
    pub fn with_threshold(fraction_threshold: f64) -> Self {
        Self { fraction_threshold }
    }

    /// 归一化 BOM 占比: 合计 ≤ 阈值时所有行 ×100
    pub fn normalize(&self, lines: &mut [BomLine]) {
        let sum: f64 = lines.iter().map(|l| l.percentage_required).sum();
        if sum > 0.0 && sum <= self.fraction_threshold {
            debug!(sum, "BOM 占比为小数形式, 统一 ×100 归一化");
            for line in lines.iter_mut() {
                line.percentage_required *= 100.0;
            }
        }
    }

    /// 由 BOM 行构建回退配方
    ///
    /// - sequence 取 BOM 行值, 缺失按位置 (1 起始)
    /// - waiting_time 缺失按 0
    /// - percentage 即归一化后的 percentage_required
    pub fn build_formulation(
        &self,
        master_product_id: &str,
        mut lines: Vec<BomLine>,
    ) -> Formulation {
        self.normalize(&mut lines);

        let mut formulation = Formulation::new(master_product_id);
        for (idx, line) in lines.into_iter().enumerate() {
            formulation.items.push(RecipeLineItem {
                material_id: line.raw_material_id,
                percentage: Some(line.percentage_required),
                total_percentage: None,
                wt_per_liter: None,
                sequence: line.sequence.unwrap_or((idx + 1) as i32),
                waiting_time_min: line.waiting_time_min.unwrap_or(0),
            });
        }
        formulation
    }
}

impl Default for BomNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
