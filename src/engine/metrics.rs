// ==========================================
// 涂料配方开发系统 - 配方指标引擎
// ==========================================
// 职责: 由配方行 + 原材料目录派生聚合指标
//       (体积/固含/SVR/PVC/CPVC/密度/升成本), 全部纯函数
// 红线: 指标只派生不回写配方行; 每次取值重算, 不做缓存
// 输入: Formulation + MaterialCatalog
// 输出: FormulationMetrics
// ==========================================

use crate::domain::formulation::Formulation;
use crate::domain::material::{MaterialCatalog, RawMaterial};
use crate::domain::types::Subcategory;
use crate::engine::policy;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// FormulationMetrics - 配方聚合指标
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulationMetrics {
    pub total_percentage: f64,           // Σ percentage (完整配方应为 100, 编辑期不强制)
    pub total_volume: f64,               // Σ percentage / 有效密度
    pub total_solids: f64,               // Σ percentage × 固含/100
    pub solid_volume: f64,               // 固体体积 (树脂走固体密度口径)
    pub svr: f64,                        // 固体体积比 (%)
    pub pvc: f64,                        // 颜料体积浓度 (%)
    pub cpvc: f64,                       // 临界 PVC (经验常数, 含颜填料=52)
    pub density: f64,                    // 成品密度 = Σpercentage / 总体积
    pub production_cost_per_liter: f64,  // 升成本 = (Σ percentage×单价 / 100) × 密度
}

// ==========================================
// MetricsEngine - 配方指标引擎
// ==========================================
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算单组分配方的全部聚合指标
    ///
    /// 边界口径:
    /// - 未录入的 percentage 按 0 参与
    /// - 目录缺档的材料按缺省物性参与 (密度 1 / 固含 0 / 通用类)
    /// - 空配方与全零分母时所有比值指标为 0, 不产出 NaN/Inf
    #[instrument(skip(self, formulation, catalog), fields(product = %formulation.master_product_id, items = formulation.items.len()))]
    pub fn compute(
        &self,
        formulation: &Formulation,
        catalog: &MaterialCatalog,
    ) -> FormulationMetrics {
        let mut total_percentage = 0.0;
        let mut total_volume = 0.0;
        let mut total_solids = 0.0;
        let mut solid_volume = 0.0;
        let mut pigment_volume = 0.0;
        let mut binder_volume = 0.0;
        let mut raw_cost = 0.0;
        let mut has_extender = false;

        for item in &formulation.items {
            let fallback;
            let material: &RawMaterial = match catalog.get(&item.material_id) {
                Some(m) => m,
                None => {
                    fallback = RawMaterial::minimal(&item.material_id, &item.material_id);
                    &fallback
                }
            };

            let pct = item.percentage_or_zero();
            let density = policy::effective_density(material);
            let solids = policy::effective_solids(material);

            total_percentage += pct;
            total_volume += pct / density;
            total_solids += pct * solids / 100.0;
            solid_volume += pct * solids / 100.0 / policy::effective_solid_density(material);

            match material.subcategory {
                // 颜填料: PVC 分子 (按全体积参与)
                Subcategory::Extender => {
                    has_extender = true;
                    pigment_volume += pct / density;
                }
                // 树脂: PVC 分母 (固含缺省 100, 固体密度缺省回退密度)
                Subcategory::Resin => {
                    binder_volume += pct * policy::binder_solids(material) / 100.0
                        / policy::binder_solid_density(material);
                }
                _ => {}
            }

            if let Some(cost) = material.purchase_cost {
                raw_cost += pct * cost;
            }
        }

        let svr = policy::safe_ratio(solid_volume, total_volume) * 100.0;
        let pvc = policy::safe_ratio(pigment_volume, pigment_volume + binder_volume) * 100.0;
        let cpvc = if has_extender {
            policy::CPVC_WITH_EXTENDER
        } else {
            0.0
        };
        let density = policy::safe_ratio(total_percentage, total_volume);
        let production_cost_per_liter = raw_cost / 100.0 * density;

        FormulationMetrics {
            total_percentage,
            total_volume,
            total_solids,
            solid_volume,
            svr,
            pvc,
            cpvc,
            density,
            production_cost_per_liter,
        }
    }

    /// 双组分混合指标: 主漆/固化剂各自按 §单组分口径计算后, 按混合比加权
    ///
    /// mixture = base × r_b/(r_b+r_h) + hardener × r_h/(r_b+r_h)
    /// 混合比合计为 0 时全部指标为 0
    pub fn compute_mixture(
        &self,
        base: &FormulationMetrics,
        hardener: &FormulationMetrics,
        base_ratio: f64,
        hardener_ratio: f64,
    ) -> FormulationMetrics {
        let ratio_sum = base_ratio + hardener_ratio;
        if ratio_sum == 0.0 {
            return FormulationMetrics::default();
        }

        let wb = base_ratio / ratio_sum;
        let wh = hardener_ratio / ratio_sum;
        let blend = |b: f64, h: f64| b * wb + h * wh;

        FormulationMetrics {
            total_percentage: blend(base.total_percentage, hardener.total_percentage),
            total_volume: blend(base.total_volume, hardener.total_volume),
            total_solids: blend(base.total_solids, hardener.total_solids),
            solid_volume: blend(base.solid_volume, hardener.solid_volume),
            svr: blend(base.svr, hardener.svr),
            pvc: blend(base.pvc, hardener.pvc),
            cpvc: blend(base.cpvc, hardener.cpvc),
            density: blend(base.density, hardener.density),
            production_cost_per_liter: blend(
                base.production_cost_per_liter,
                hardener.production_cost_per_liter,
            ),
        }
    }

    /// 百分比 → 投料重量 (kg): weight_i = percentage_i / 100 × 计划量
    pub fn item_weights_kg(
        &self,
        formulation: &Formulation,
        planned_quantity_kg: f64,
    ) -> Vec<(String, f64)> {
        formulation
            .items
            .iter()
            .map(|item| {
                (
                    item.material_id.clone(),
                    item.percentage_or_zero() / 100.0 * planned_quantity_kg,
                )
            })
            .collect()
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}
