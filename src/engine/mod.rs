// ==========================================
// 涂料配方开发系统 - 引擎层
// ==========================================
// 职责: 实现配方计算规则, 不拼 SQL
// 红线: Engine 不拼 SQL; 所有比值计算必须防除零, 任何指标不得产出 NaN/Inf
// ==========================================

pub mod bom;
pub mod metrics;
pub mod policy;
pub mod recalc;

// 重导出核心引擎
pub use bom::BomNormalizer;
pub use metrics::{FormulationMetrics, MetricsEngine};
pub use recalc::RecipeRecalcEngine;
