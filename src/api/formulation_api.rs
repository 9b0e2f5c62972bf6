// ==========================================
// 涂料配方开发系统 - 配方 API
// ==========================================
// 职责: 配方加载 (保存配方 → BOM 回退 → 空白) / 行编辑 / 保存
// 红线: 网络/持久化边界按顺序 await, 失败时不产生部分提交
//       (唯一例外: 双组分两份快照不在同一事务, 部分失败显式报出)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::SaveValidator;
use crate::config::ConfigManager;
use crate::domain::formulation::{Formulation, RecipeSnapshot, TwoPartSystem};
use crate::domain::material::MaterialCatalog;
use crate::domain::types::{ComponentTable, EditField, RecipeStatus};
use crate::engine::bom::BomNormalizer;
use crate::engine::metrics::{FormulationMetrics, MetricsEngine};
use crate::engine::recalc::RecipeRecalcEngine;
use crate::repository::{BomSource, MasterProductRepository, RecipeRepository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// LoadSource - 配方加载来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadSource {
    SavedRecipe, // 已保存的配方快照
    BomFallback, // BOM 标准配方回退
    Empty,       // 无任何来源, 空白配方
}

// ==========================================
// LoadedFormulation - 加载结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedFormulation {
    pub formulation: Formulation,
    pub source: LoadSource,
    pub status: Option<RecipeStatus>, // 仅保存配方来源有状态
}

// ==========================================
// MetricsBundle - 指标汇总 (主漆/固化剂/混合)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub base: FormulationMetrics,
    pub hardener: Option<FormulationMetrics>,
    pub mixture: Option<FormulationMetrics>,
}

// ==========================================
// SaveOutcome - 保存结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub base_snapshot_id: String,
    pub base_status: RecipeStatus,
    pub hardener_snapshot_id: Option<String>,
    pub hardener_status: Option<RecipeStatus>,
}

// ==========================================
// FormulationApi - 配方 API
// ==========================================

/// 配方API
///
/// 职责：
/// 1. 配方加载（保存配方 → BOM 回退 → 空白）
/// 2. 行编辑（增/删/改/重排, 经联动重算引擎）
/// 3. 指标派生（主漆/固化剂/混合）
/// 4. 保存（校验门 + 双快照 + 固化剂关联更新）
pub struct FormulationApi {
    product_repo: Arc<MasterProductRepository>,
    recipe_repo: Arc<RecipeRepository>,
    bom_source: Arc<dyn BomSource>,
    config_manager: Arc<ConfigManager>,
    recalc_engine: RecipeRecalcEngine,
    metrics_engine: MetricsEngine,
}

impl FormulationApi {
    /// 创建新的FormulationApi实例
    ///
    /// # 参数
    /// - product_repo: 主产品档案仓储
    /// - recipe_repo: 配方快照仓储
    /// - bom_source: BOM 回退来源
    /// - config_manager: 配置管理器
    pub fn new(
        product_repo: Arc<MasterProductRepository>,
        recipe_repo: Arc<RecipeRepository>,
        bom_source: Arc<dyn BomSource>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            recipe_repo,
            bom_source,
            config_manager,
            recalc_engine: RecipeRecalcEngine::new(),
            metrics_engine: MetricsEngine::new(),
        }
    }

    // ==========================================
    // 加载接口
    // ==========================================

    /// 加载单组分配方
    ///
    /// 回退链: 保存配方快照 → BOM 标准配方 (归一化) → 空白配方
    /// 任一环节失败即返回错误, 不产生部分状态
    #[instrument(skip(self), fields(product = %master_product_id))]
    pub async fn load_formulation(
        &self,
        master_product_id: &str,
    ) -> ApiResult<LoadedFormulation> {
        // 产品存在性检查
        self.product_repo
            .find_by_id(master_product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("主产品不存在: {}", master_product_id)))?;

        // 1. 保存配方快照
        if let Some(snapshot) = self.recipe_repo.find_current(master_product_id)? {
            let mut formulation = Formulation::new(master_product_id);
            formulation.mixing_ratio_part = snapshot.mixing_ratio_part.unwrap_or(0.0);
            formulation.items = snapshot.items.clone();
            info!(snapshot_id = %snapshot.snapshot_id, "加载已保存配方");
            return Ok(LoadedFormulation {
                formulation,
                source: LoadSource::SavedRecipe,
                status: Some(snapshot.status),
            });
        }

        // 2. BOM 回退
        let bom_lines = self.bom_source.fetch_bom(master_product_id).await?;
        if !bom_lines.is_empty() {
            let threshold = self
                .config_manager
                .get_bom_fraction_threshold()
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
            let formulation = BomNormalizer::with_threshold(threshold)
                .build_formulation(master_product_id, bom_lines);
            info!(items = formulation.items.len(), "无保存配方, 使用 BOM 回退");
            return Ok(LoadedFormulation {
                formulation,
                source: LoadSource::BomFallback,
                status: None,
            });
        }

        // 3. 空白配方
        info!("无保存配方且无 BOM, 返回空白配方");
        Ok(LoadedFormulation {
            formulation: Formulation::new(master_product_id),
            source: LoadSource::Empty,
            status: None,
        })
    }

    /// 加载双组分体系 (主漆 + 按档案关联的固化剂)
    ///
    /// 加载后立即重同步固化剂, 使补数不变式成立
    #[instrument(skip(self), fields(product = %base_product_id))]
    pub async fn load_two_part_system(&self, base_product_id: &str) -> ApiResult<TwoPartSystem> {
        let base_product = self
            .product_repo
            .find_by_id(base_product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("主产品不存在: {}", base_product_id)))?;

        let base = self.load_formulation(base_product_id).await?.formulation;

        let mut system = match base_product.hardener_product_id {
            Some(hardener_id) => {
                let hardener = self.load_formulation(&hardener_id).await?.formulation;
                let base_ratio = base.mixing_ratio_part;
                let hardener_ratio = hardener.mixing_ratio_part;
                TwoPartSystem::with_hardener(base, hardener, base_ratio, hardener_ratio)
            }
            None => TwoPartSystem::single(base),
        };

        let catalog = self.product_repo.load_catalog()?;
        self.recalc_engine.resync_hardener(&mut system, &catalog);
        Ok(system)
    }

    // ==========================================
    // 行编辑接口
    // ==========================================

    /// 新增配方行 (材料必须存在于档案; 重复添加受档案标志约束)
    pub fn add_item(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        material_id: &str,
    ) -> ApiResult<()> {
        let material = self
            .product_repo
            .find_by_id(material_id)?
            .ok_or_else(|| ApiError::InvalidInput(format!("原材料不存在: {}", material_id)))?;

        let formulation = self.table_mut(system, table)?;
        self.recalc_engine
            .add_item(formulation, &material)
            .map_err(|e| ApiError::BusinessRuleViolation(e.to_string()))
    }

    /// 删除配方行; 主漆删行后重同步固化剂
    pub fn remove_item(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        sequence: i32,
    ) -> ApiResult<MetricsBundle> {
        {
            let formulation = self.table_mut(system, table)?;
            self.recalc_engine
                .remove_item(formulation, sequence)
                .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        }

        let catalog = self.product_repo.load_catalog()?;
        if table == ComponentTable::Base {
            self.recalc_engine.resync_hardener(system, &catalog);
        }
        Ok(self.bundle_metrics(system, &catalog))
    }

    /// 编辑配方行, 返回刷新后的指标汇总
    pub fn update_item(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        sequence: i32,
        field: EditField,
        raw_value: &str,
    ) -> ApiResult<MetricsBundle> {
        let catalog = self.product_repo.load_catalog()?;
        self.recalc_engine
            .update_item(system, table, sequence, field, raw_value, &catalog)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        Ok(self.bundle_metrics(system, &catalog))
    }

    /// 单组分配方行编辑 (简单开发页): 直接覆盖, 不做跨行联动
    ///
    /// 返回刷新后的聚合指标 (密度/升成本等随编辑重新派生)
    pub fn update_item_single(
        &self,
        formulation: &mut Formulation,
        sequence: i32,
        field: EditField,
        raw_value: &str,
    ) -> ApiResult<FormulationMetrics> {
        self.recalc_engine
            .update_item_single(formulation, sequence, field, raw_value)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let catalog = self.product_repo.load_catalog()?;
        Ok(self.metrics_engine.compute(formulation, &catalog))
    }

    /// 百分比 → 投料重量换算 (kg)
    ///
    /// planned_quantity_kg 未指定时取配置缺省值
    pub fn item_weights(
        &self,
        formulation: &Formulation,
        planned_quantity_kg: Option<f64>,
    ) -> ApiResult<Vec<(String, f64)>> {
        let quantity = match planned_quantity_kg {
            Some(q) if q > 0.0 => q,
            Some(q) => {
                return Err(ApiError::InvalidInput(format!("计划投产量必须为正: {}", q)));
            }
            None => self
                .config_manager
                .get_default_planned_quantity_kg()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };
        Ok(self.metrics_engine.item_weights_kg(formulation, quantity))
    }

    /// 列合计整体缩放
    pub fn rescale_column_total(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        new_total: f64,
    ) -> ApiResult<MetricsBundle> {
        let catalog = self.product_repo.load_catalog()?;
        self.recalc_engine
            .rescale_column_total(system, table, new_total, &catalog)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        Ok(self.bundle_metrics(system, &catalog))
    }

    /// 拖拽重排 (只影响 sequence, 不触发占比重算)
    pub fn reorder_items(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        from_index: usize,
        to_index: usize,
    ) -> ApiResult<()> {
        let formulation = self.table_mut(system, table)?;
        self.recalc_engine
            .reorder_item(formulation, from_index, to_index)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))
    }

    // ==========================================
    // 指标接口
    // ==========================================

    /// 派生当前体系的指标汇总 (主漆/固化剂/混合)
    pub fn compute_metrics(&self, system: &TwoPartSystem) -> ApiResult<MetricsBundle> {
        let catalog = self.product_repo.load_catalog()?;
        Ok(self.bundle_metrics(system, &catalog))
    }

    fn bundle_metrics(&self, system: &TwoPartSystem, catalog: &MaterialCatalog) -> MetricsBundle {
        let base = self.metrics_engine.compute(&system.base, catalog);
        let hardener = system
            .hardener
            .as_ref()
            .map(|h| self.metrics_engine.compute(h, catalog));
        let mixture = hardener.as_ref().map(|h| {
            self.metrics_engine
                .compute_mixture(&base, h, system.base_ratio, system.hardener_ratio)
        });
        MetricsBundle {
            base,
            hardener,
            mixture,
        }
    }

    // ==========================================
    // 保存接口
    // ==========================================

    /// 保存双组分配方
    ///
    /// 流程:
    /// 1. 保存前置校验 (占比完整性 + 固化剂约束)
    /// 2. 保存主漆快照 (取代语义)
    /// 3. 保存固化剂快照
    /// 4. 更新主漆档案的固化剂关联
    ///
    /// 步骤 2 成功后步骤 3/4 失败 → PartialSaveFailure
    /// (主漆已落库的事实显式报出, 不回滚)
    #[instrument(skip(self, system), fields(product = %system.base.master_product_id))]
    pub async fn save_formulation(
        &self,
        system: &TwoPartSystem,
        operator: &str,
    ) -> ApiResult<SaveOutcome> {
        let tolerance = self
            .config_manager
            .get_completeness_tolerance()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let validator = SaveValidator::new(tolerance);

        // 1. 校验门
        validator.validate_for_save(system)?;

        // 记录保存时生效的计算口径 (容差/阈值等)
        if let Ok(config_snapshot) = self.config_manager.get_config_snapshot() {
            debug!(config = %config_snapshot, "保存时配置快照");
        }

        let catalog = self.product_repo.load_catalog()?;

        // 2. 主漆快照
        let base_metrics = self.metrics_engine.compute(&system.base, &catalog);
        let base_status = validator.compute_status(&system.base);
        let base_snapshot = RecipeSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            master_product_id: system.base.master_product_id.clone(),
            density: base_metrics.density,
            viscosity: None,
            water_pct: None,
            mixing_ratio_part: Some(system.base_ratio),
            status: base_status,
            items: system.base.items.clone(),
            created_by: Some(operator.to_string()),
            created_at: Utc::now(),
        };
        self.recipe_repo.save_snapshot(&base_snapshot)?;
        info!(snapshot_id = %base_snapshot.snapshot_id, status = %base_status, "主漆快照已保存");

        // 3. 固化剂快照 + 4. 关联更新
        let mut hardener_snapshot_id = None;
        let mut hardener_status = None;
        if let Some(hardener) = &system.hardener {
            if !hardener.items.is_empty() {
                let h_metrics = self.metrics_engine.compute(hardener, &catalog);
                let h_status = validator.compute_status(hardener);
                let h_snapshot = RecipeSnapshot {
                    snapshot_id: Uuid::new_v4().to_string(),
                    master_product_id: hardener.master_product_id.clone(),
                    density: h_metrics.density,
                    viscosity: None,
                    water_pct: None,
                    mixing_ratio_part: Some(system.hardener_ratio),
                    status: h_status,
                    items: hardener.items.clone(),
                    created_by: Some(operator.to_string()),
                    created_at: Utc::now(),
                };
                self.recipe_repo.save_snapshot(&h_snapshot).map_err(|e| {
                    warn!(error = %e, "固化剂快照保存失败, 主漆已落库");
                    ApiError::PartialSaveFailure {
                        base_product_id: system.base.master_product_id.clone(),
                        message: format!("固化剂快照保存失败: {}", e),
                    }
                })?;
                hardener_snapshot_id = Some(h_snapshot.snapshot_id);
                hardener_status = Some(h_status);
            }

            self.product_repo
                .update_hardener_link(
                    &system.base.master_product_id,
                    Some(&hardener.master_product_id),
                )
                .map_err(|e| {
                    warn!(error = %e, "固化剂关联更新失败, 主漆已落库");
                    ApiError::PartialSaveFailure {
                        base_product_id: system.base.master_product_id.clone(),
                        message: format!("固化剂关联更新失败: {}", e),
                    }
                })?;
        }

        Ok(SaveOutcome {
            base_snapshot_id: base_snapshot.snapshot_id,
            base_status,
            hardener_snapshot_id,
            hardener_status,
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn table_mut<'a>(
        &self,
        system: &'a mut TwoPartSystem,
        table: ComponentTable,
    ) -> ApiResult<&'a mut Formulation> {
        match table {
            ComponentTable::Base => Ok(&mut system.base),
            ComponentTable::Hardener => system
                .hardener
                .as_mut()
                .ok_or_else(|| ApiError::InvalidInput("该产品未关联固化剂配方".to_string())),
        }
    }
}
