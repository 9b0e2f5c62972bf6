// ==========================================
// 涂料配方开发系统 - 配方联动重算引擎
// ==========================================
// 职责: 行编辑触发的级联重算 (单组分直接覆盖 / 双组分占比联动)
// 红线: 主漆驱动固化剂, 固化剂永远不反向驱动主漆;
//       固化剂的 total_percentage 与 wt_per_liter 只读派生
// 输入: TwoPartSystem + 编辑动作 (表/行/字段/原始输入)
// 输出: 原地更新后的体系 (单次事件内同步完成, 无隐藏响应图)
// ==========================================
// 联动规则:
// 1) 主漆行改 total_percentage → 按新合计反算全部主漆 percentage,
//    再按补数重同步固化剂
// 2) 主漆行改 percentage → 目标毛合计 = base_ratio/(base_ratio+hardener_ratio)×100
//    (混合比未设时回退当前毛合计, 再回退 100), 按占比重分配 total_percentage
// 3) 固化剂行改 percentage → 固化剂毛合计恒为 100−主漆毛合计,
//    total_percentage = percentage × 毛合计 / 100
// 4) 列合计整体缩放 → total_percentage_i = percentage_i/100 × 新合计,
//    percentage 随新分布归一化
// ==========================================

use crate::domain::formulation::{Formulation, RecipeLineItem, TwoPartSystem};
use crate::domain::material::{MaterialCatalog, RawMaterial};
use crate::domain::types::{ComponentTable, EditField};
use crate::engine::policy;
use std::error::Error;
use tracing::{debug, instrument};

// ==========================================
// RecipeRecalcEngine - 配方联动重算引擎
// ==========================================
pub struct RecipeRecalcEngine;

impl RecipeRecalcEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 输入净化
    // ==========================================

    /// 净化数值输入: 去掉一个前导零（后随小数点的除外）
    ///
    /// "05" → "5", "0.5" → "0.5", "0" → "0"
    pub fn sanitize_numeric_input(raw: &str) -> String {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        if let (Some('0'), Some(second)) = (chars.next(), chars.next()) {
            if second != '.' {
                return trimmed[1..].to_string();
            }
        }
        trimmed.to_string()
    }

    /// 解析占比输入: 非法输入按 0 参与, 不报错
    pub fn parse_percentage(raw: &str) -> f64 {
        Self::sanitize_numeric_input(raw)
            .parse::<f64>()
            .unwrap_or(0.0)
    }

    /// 解析等待时间输入: 非法/负值按 0
    pub fn parse_waiting_time(raw: &str) -> i32 {
        raw.trim().parse::<i32>().unwrap_or(0).max(0)
    }

    // ==========================================
    // 行操作
    // ==========================================

    /// 新增配方行
    ///
    /// 失败 (状态不变):
    /// - 材料已存在且档案未标记"允许重复添加"
    pub fn add_item(
        &self,
        formulation: &mut Formulation,
        material: &RawMaterial,
    ) -> Result<(), Box<dyn Error>> {
        let duplicated = formulation.find_item(&material.master_product_id).is_some();
        if duplicated && !material.can_repeat {
            return Err(format!(
                "材料已在配方中且不允许重复添加: {}",
                material.master_product_name
            )
            .into());
        }

        let sequence = (formulation.items.len() + 1) as i32;
        formulation
            .items
            .push(RecipeLineItem::new(&material.master_product_id, sequence));
        Ok(())
    }

    /// 删除配方行并重排 sequence
    pub fn remove_item(
        &self,
        formulation: &mut Formulation,
        sequence: i32,
    ) -> Result<(), Box<dyn Error>> {
        let idx = formulation
            .items
            .iter()
            .position(|i| i.sequence == sequence)
            .ok_or_else(|| format!("配方行不存在: sequence={}", sequence))?;
        formulation.items.remove(idx);
        formulation.renumber();
        Ok(())
    }

    /// 拖拽重排: 将 from_index 行移动到 to_index, 重排 sequence
    ///
    /// 只影响显示/投料顺序, 不触发占比重算
    pub fn reorder_item(
        &self,
        formulation: &mut Formulation,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), Box<dyn Error>> {
        let len = formulation.items.len();
        if from_index >= len || to_index >= len {
            return Err(format!(
                "重排下标越界: from={}, to={}, len={}",
                from_index, to_index, len
            )
            .into());
        }
        let item = formulation.items.remove(from_index);
        formulation.items.insert(to_index, item);
        formulation.renumber();
        Ok(())
    }

    // ==========================================
    // 单组分编辑 (直接覆盖, 不做跨行联动)
    // ==========================================

    /// 单组分配方行编辑: percentage 直接覆盖, 聚合指标由 MetricsEngine 另行派生
    pub fn update_item_single(
        &self,
        formulation: &mut Formulation,
        sequence: i32,
        field: EditField,
        raw_value: &str,
    ) -> Result<(), Box<dyn Error>> {
        let item = formulation
            .items
            .iter_mut()
            .find(|i| i.sequence == sequence)
            .ok_or_else(|| format!("配方行不存在: sequence={}", sequence))?;

        match field {
            EditField::Percentage => {
                let value = Self::parse_percentage(raw_value);
                Self::check_percentage_range(value)?;
                item.percentage = Some(value);
            }
            EditField::WaitingTime => {
                item.waiting_time_min = Self::parse_waiting_time(raw_value);
            }
            EditField::TotalPercentage => {
                return Err("单组分配方没有毛批次占比字段".into());
            }
        }
        Ok(())
    }

    // ==========================================
    // 双组分编辑 (联动规则 1-3)
    // ==========================================

    /// 双组分行编辑统一入口
    ///
    /// 整个级联在一次调用内同步完成; 任何规则失败时体系保持调用前状态
    /// (先校验再落值)
    #[instrument(skip(self, system, catalog), fields(table = %table, sequence = sequence, field = %field))]
    pub fn update_item(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        sequence: i32,
        field: EditField,
        raw_value: &str,
        catalog: &MaterialCatalog,
    ) -> Result<(), Box<dyn Error>> {
        match (table, field) {
            // 等待时间: 两表均可直接编辑, 无联动
            (ComponentTable::Base, EditField::WaitingTime) => {
                let item = Self::find_item_mut(&mut system.base, sequence)?;
                item.waiting_time_min = Self::parse_waiting_time(raw_value);
                Ok(())
            }
            (ComponentTable::Hardener, EditField::WaitingTime) => {
                let hardener = Self::hardener_mut(system)?;
                let item = Self::find_item_mut(hardener, sequence)?;
                item.waiting_time_min = Self::parse_waiting_time(raw_value);
                Ok(())
            }

            // 规则1: 主漆行改毛批次占比
            (ComponentTable::Base, EditField::TotalPercentage) => {
                let value = Self::parse_percentage(raw_value);
                Self::check_percentage_range(value)?;
                self.apply_base_total_percentage_edit(system, sequence, value, catalog)
            }

            // 规则2: 主漆行改净占比
            (ComponentTable::Base, EditField::Percentage) => {
                let value = Self::parse_percentage(raw_value);
                Self::check_percentage_range(value)?;
                self.apply_base_percentage_edit(system, sequence, value, catalog)
            }

            // 规则3: 固化剂行改净占比
            (ComponentTable::Hardener, EditField::Percentage) => {
                let value = Self::parse_percentage(raw_value);
                Self::check_percentage_range(value)?;
                self.apply_hardener_percentage_edit(system, sequence, value, catalog)
            }

            // 固化剂的毛批次占比只读派生
            (ComponentTable::Hardener, EditField::TotalPercentage) => {
                Err("固化剂的毛批次占比为派生字段, 不可直接编辑".into())
            }
        }
    }

    /// 规则4: 列合计整体缩放
    ///
    /// total_percentage_i = percentage_i/100 × 新合计;
    /// percentage 按新分布归一化; 主漆表缩放后重同步固化剂
    pub fn rescale_column_total(
        &self,
        system: &mut TwoPartSystem,
        table: ComponentTable,
        new_total: f64,
        catalog: &MaterialCatalog,
    ) -> Result<(), Box<dyn Error>> {
        Self::check_percentage_range(new_total)?;

        let formulation = match table {
            ComponentTable::Base => &mut system.base,
            ComponentTable::Hardener => Self::hardener_mut(system)?,
        };

        for item in &mut formulation.items {
            let tp = item.percentage_or_zero() / 100.0 * new_total;
            item.total_percentage = Some(tp);
        }

        let total_sum = formulation.total_percentage_sum();
        for item in &mut formulation.items {
            item.percentage =
                Some(policy::safe_ratio(item.total_percentage_or_zero(), total_sum) * 100.0);
        }
        Self::refresh_wt_per_liter(formulation, catalog);

        if table == ComponentTable::Base {
            self.resync_hardener(system, catalog);
        }
        Ok(())
    }

    // ==========================================
    // 规则实现
    // ==========================================

    /// 规则1: 设定毛占比 → 反算全部主漆净占比 → 重同步固化剂
    fn apply_base_total_percentage_edit(
        &self,
        system: &mut TwoPartSystem,
        sequence: i32,
        value: f64,
        catalog: &MaterialCatalog,
    ) -> Result<(), Box<dyn Error>> {
        {
            let item = Self::find_item_mut(&mut system.base, sequence)?;
            item.total_percentage = Some(value);
        }

        let base_total = system.base.total_percentage_sum();
        for item in &mut system.base.items {
            item.percentage =
                Some(policy::safe_ratio(item.total_percentage_or_zero(), base_total) * 100.0);
        }
        Self::refresh_wt_per_liter(&mut system.base, catalog);

        debug!(base_total, "主漆毛合计已变更, 重同步固化剂");
        self.resync_hardener(system, catalog);
        Ok(())
    }

    /// 规则2: 设定净占比 → 按混合比目标合计重分配毛占比 → 重同步固化剂
    fn apply_base_percentage_edit(
        &self,
        system: &mut TwoPartSystem,
        sequence: i32,
        value: f64,
        catalog: &MaterialCatalog,
    ) -> Result<(), Box<dyn Error>> {
        {
            let item = Self::find_item_mut(&mut system.base, sequence)?;
            item.percentage = Some(value);
        }

        let target_total = Self::base_target_total(system);
        let pct_sum = system.base.percentage_sum();
        for item in &mut system.base.items {
            item.total_percentage =
                Some(policy::safe_ratio(item.percentage_or_zero(), pct_sum) * target_total);
        }
        Self::refresh_wt_per_liter(&mut system.base, catalog);

        self.resync_hardener(system, catalog);
        Ok(())
    }

    /// 规则3: 固化剂净占比编辑 (毛合计恒为主漆补数)
    fn apply_hardener_percentage_edit(
        &self,
        system: &mut TwoPartSystem,
        sequence: i32,
        value: f64,
        catalog: &MaterialCatalog,
    ) -> Result<(), Box<dyn Error>> {
        {
            let hardener = Self::hardener_mut(system)?;
            let item = Self::find_item_mut(hardener, sequence)?;
            item.percentage = Some(value);
        }

        let hardener_total = system.expected_hardener_total();
        if let Some(hardener) = system.hardener.as_mut() {
            for item in &mut hardener.items {
                let tp = item.percentage_or_zero() * hardener_total / 100.0;
                item.total_percentage = Some(tp);
            }
            Self::refresh_wt_per_liter(hardener, catalog);
        }
        Ok(())
    }

    /// 固化剂重同步 (规则1尾部, 唯一入口)
    ///
    /// 不变式: Σ hardener.total_percentage = 100 − Σ base.total_percentage
    /// - total_percentage_i = percentage_i × 固化剂毛合计 / 100
    /// - 毛合计 > 0 时净占比按 total_percentage_i / 毛合计 × 100 回算
    ///   (毛合计为 0 时净占比保持, 避免除零)
    pub fn resync_hardener(&self, system: &mut TwoPartSystem, catalog: &MaterialCatalog) {
        let hardener_total = system.expected_hardener_total();
        let Some(hardener) = system.hardener.as_mut() else {
            return;
        };

        for item in &mut hardener.items {
            let tp = item.percentage_or_zero() * hardener_total / 100.0;
            item.total_percentage = Some(tp);
            if hardener_total > 0.0 {
                item.percentage = Some(tp / hardener_total * 100.0);
            }
        }
        Self::refresh_wt_per_liter(hardener, catalog);
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 规则2 的目标毛合计:
    /// 混合比已设 → base_ratio/(base_ratio+hardener_ratio)×100;
    /// 未设且当前毛合计非零 → 当前毛合计; 否则 100
    fn base_target_total(system: &TwoPartSystem) -> f64 {
        let ratio_sum = system.base_ratio + system.hardener_ratio;
        if ratio_sum > 0.0 {
            return system.base_ratio / ratio_sum * 100.0;
        }
        let current = system.base.total_percentage_sum();
        if current > 0.0 {
            current
        } else {
            100.0
        }
    }

    /// 按毛占比与有效密度刷新整表升料重
    fn refresh_wt_per_liter(formulation: &mut Formulation, catalog: &MaterialCatalog) {
        for item in &mut formulation.items {
            let fallback;
            let material: &RawMaterial = match catalog.get(&item.material_id) {
                Some(m) => m,
                None => {
                    fallback = RawMaterial::minimal(&item.material_id, &item.material_id);
                    &fallback
                }
            };
            let density = policy::effective_wt_density(material);
            item.wt_per_liter = Some(item.total_percentage_or_zero() / density);
        }
    }

    fn find_item_mut(
        formulation: &mut Formulation,
        sequence: i32,
    ) -> Result<&mut RecipeLineItem, Box<dyn Error>> {
        formulation
            .items
            .iter_mut()
            .find(|i| i.sequence == sequence)
            .ok_or_else(|| format!("配方行不存在: sequence={}", sequence).into())
    }

    fn hardener_mut(system: &mut TwoPartSystem) -> Result<&mut Formulation, Box<dyn Error>> {
        system
            .hardener
            .as_mut()
            .ok_or_else(|| Box::<dyn Error>::from("该产品未关联固化剂配方"))
    }

    fn check_percentage_range(value: f64) -> Result<(), Box<dyn Error>> {
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("占比超出范围 [0, 100]: {}", value).into());
        }
        Ok(())
    }
}

impl Default for RecipeRecalcEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Subcategory;

    // ==========================================
    // 测试数据准备
    // ==========================================

    /// 不变式容差
    const TOL: f64 = 0.01;

    fn catalog() -> MaterialCatalog {
        let mut resin = RawMaterial::minimal("RM-R", "环氧树脂");
        resin.subcategory = Subcategory::Resin;
        resin.density = Some(1.1);

        let mut extender = RawMaterial::minimal("RM-E", "钛白粉");
        extender.subcategory = Subcategory::Extender;
        extender.density = Some(2.0);

        let mut solvent = RawMaterial::minimal("RM-S", "二甲苯");
        solvent.density = Some(0.87);

        let mut hardener = RawMaterial::minimal("RM-H", "聚酰胺固化剂");
        hardener.subcategory = Subcategory::Hardener;
        hardener.density = Some(0.95);

        MaterialCatalog::new(vec![resin, extender, solvent, hardener])
    }

    fn item(id: &str, seq: i32, pct: f64, tp: f64) -> RecipeLineItem {
        RecipeLineItem {
            percentage: Some(pct),
            total_percentage: Some(tp),
            ..RecipeLineItem::new(id, seq)
        }
    }

    /// 主漆 2 行各占 50/50 (毛合计 80) + 固化剂 1 行 100% (毛合计 20), 4:1 体系
    fn two_part_system() -> TwoPartSystem {
        let mut base = Formulation::new("FP-BASE");
        base.items.push(item("RM-R", 1, 50.0, 40.0));
        base.items.push(item("RM-E", 2, 50.0, 40.0));

        let mut hardener = Formulation::new("FP-HARD");
        hardener.items.push(item("RM-H", 1, 100.0, 20.0));

        TwoPartSystem::with_hardener(base, hardener, 4.0, 1.0)
    }

    fn assert_complement_invariant(system: &TwoPartSystem) {
        let base_total = system.base.total_percentage_sum();
        let hardener_total = system
            .hardener
            .as_ref()
            .map(|h| h.total_percentage_sum())
            .unwrap_or(0.0);
        assert!(
            (hardener_total - (100.0 - base_total)).abs() < TOL,
            "补数不变式被破坏: base={}, hardener={}",
            base_total,
            hardener_total
        );
    }

    // ==========================================
    // 第一部分：输入净化
    // ==========================================

    #[test]
    fn test_scenario_1_sanitize_leading_zero() {
        // 场景1: 前导零净化
        assert_eq!(RecipeRecalcEngine::sanitize_numeric_input("05"), "5");
        assert_eq!(RecipeRecalcEngine::sanitize_numeric_input("0.5"), "0.5");
        assert_eq!(RecipeRecalcEngine::sanitize_numeric_input("0"), "0");
        assert_eq!(RecipeRecalcEngine::sanitize_numeric_input(" 042 "), "42");
    }

    #[test]
    fn test_scenario_2_invalid_input_parses_to_zero() {
        // 场景2: 非法输入按 0 参与
        assert_eq!(RecipeRecalcEngine::parse_percentage("abc"), 0.0);
        assert_eq!(RecipeRecalcEngine::parse_percentage(""), 0.0);
        assert_eq!(RecipeRecalcEngine::parse_percentage("12.5"), 12.5);
        assert_eq!(RecipeRecalcEngine::parse_waiting_time("-5"), 0);
        assert_eq!(RecipeRecalcEngine::parse_waiting_time("30"), 30);
    }

    // ==========================================
    // 第二部分：行操作
    // ==========================================

    #[test]
    fn test_scenario_3_add_item_rejects_duplicate() {
        // 场景3: 非可重复材料不允许重复添加, 失败时状态不变
        let engine = RecipeRecalcEngine::new();
        let mut f = Formulation::new("FP-001");
        let material = RawMaterial::minimal("RM-R", "环氧树脂");

        engine.add_item(&mut f, &material).unwrap();
        let result = engine.add_item(&mut f, &material);

        assert!(result.is_err(), "重复添加应失败");
        assert_eq!(f.items.len(), 1, "失败后状态不变");
    }

    #[test]
    fn test_scenario_4_add_item_allows_flagged_repeat() {
        // 场景4: 档案标记"允许重复添加"的材料可重复
        let engine = RecipeRecalcEngine::new();
        let mut f = Formulation::new("FP-001");
        let mut material = RawMaterial::minimal("RM-S", "二甲苯");
        material.can_repeat = true;

        engine.add_item(&mut f, &material).unwrap();
        engine.add_item(&mut f, &material).unwrap();

        assert_eq!(f.items.len(), 2);
        assert_eq!(f.items[1].sequence, 2, "sequence 按行数递增");
        assert!(f.items[1].percentage.is_none(), "新行占比未录入");
    }

    #[test]
    fn test_scenario_5_reorder_renumbers_only() {
        // 场景5: 拖拽重排只改 sequence, 不改占比
        let engine = RecipeRecalcEngine::new();
        let mut f = Formulation::new("FP-001");
        f.items.push(item("RM-R", 1, 60.0, 48.0));
        f.items.push(item("RM-E", 2, 40.0, 32.0));

        engine.reorder_item(&mut f, 1, 0).unwrap();

        assert_eq!(f.items[0].material_id, "RM-E");
        assert_eq!(f.items[0].sequence, 1);
        assert_eq!(f.items[1].sequence, 2);
        assert_eq!(f.items[0].percentage, Some(40.0), "占比不受重排影响");
    }

    // ==========================================
    // 第三部分：双组分联动（规则 1-3）
    // ==========================================

    #[test]
    fn test_scenario_6_rule1_total_percentage_edit() {
        // 场景6: 规则1 - 主漆行改毛占比, 净占比按新合计回算, 固化剂取补数
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        engine
            .update_item(
                &mut system,
                ComponentTable::Base,
                1,
                EditField::TotalPercentage,
                "60",
                &catalog,
            )
            .unwrap();

        // 主漆毛合计 = 60 + 40 = 100
        let base_total = system.base.total_percentage_sum();
        assert!((base_total - 100.0).abs() < TOL);
        // 净占比回算: 60/100, 40/100
        assert!((system.base.items[0].percentage.unwrap() - 60.0).abs() < TOL);
        assert!((system.base.items[1].percentage.unwrap() - 40.0).abs() < TOL);
        // 固化剂毛合计 = 100 - 100 = 0
        assert_complement_invariant(&system);
        let h = system.hardener.as_ref().unwrap();
        assert!((h.items[0].total_percentage.unwrap() - 0.0).abs() < TOL);
    }

    #[test]
    fn test_scenario_7_rule1_wt_per_liter_follows_density() {
        // 场景7: 规则1 - 升料重 = 毛占比 / 有效密度
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        engine
            .update_item(
                &mut system,
                ComponentTable::Base,
                2,
                EditField::TotalPercentage,
                "50",
                &catalog,
            )
            .unwrap();

        // RM-E 密度 2.0 → wt = 50 / 2.0 = 25
        assert!((system.base.items[1].wt_per_liter.unwrap() - 25.0).abs() < TOL);
    }

    #[test]
    fn test_scenario_8_rule2_percentage_edit_uses_mixing_ratio() {
        // 场景8: 规则2 - 主漆行改净占比, 毛合计收敛到混合比目标 (4:1 → 80)
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        engine
            .update_item(
                &mut system,
                ComponentTable::Base,
                1,
                EditField::Percentage,
                "75",
                &catalog,
            )
            .unwrap();

        // 净合计 = 75 + 50 = 125; 目标毛合计 = 4/(4+1)×100 = 80
        // tp_1 = 75/125×80 = 48, tp_2 = 50/125×80 = 32
        assert!((system.base.items[0].total_percentage.unwrap() - 48.0).abs() < TOL);
        assert!((system.base.items[1].total_percentage.unwrap() - 32.0).abs() < TOL);
        assert!((system.base.total_percentage_sum() - 80.0).abs() < TOL);
        // 固化剂毛合计回到 20
        assert_complement_invariant(&system);
    }

    #[test]
    fn test_scenario_9_rule2_fallback_without_ratio() {
        // 场景9: 规则2 - 混合比未设时目标毛合计回退当前毛合计
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();
        system.base_ratio = 0.0;
        system.hardener_ratio = 0.0;

        engine
            .update_item(
                &mut system,
                ComponentTable::Base,
                1,
                EditField::Percentage,
                "30",
                &catalog,
            )
            .unwrap();

        // 当前毛合计 80 保持; 净合计 = 30+50 = 80 → tp_1 = 30/80×80 = 30
        assert!((system.base.total_percentage_sum() - 80.0).abs() < TOL);
        assert!((system.base.items[0].total_percentage.unwrap() - 30.0).abs() < TOL);
        assert_complement_invariant(&system);
    }

    #[test]
    fn test_scenario_10_rule3_hardener_percentage_edit() {
        // 场景10: 规则3 - 固化剂行改净占比, 毛占比 = 净占比 × 补数合计 / 100
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        engine
            .update_item(
                &mut system,
                ComponentTable::Hardener,
                1,
                EditField::Percentage,
                "50",
                &catalog,
            )
            .unwrap();

        // 固化剂毛合计 = 100 - 80 = 20; tp = 50×20/100 = 10
        let h = system.hardener.as_ref().unwrap();
        assert!((h.items[0].total_percentage.unwrap() - 10.0).abs() < TOL);
        // 升料重: 10 / 0.95
        assert!((h.items[0].wt_per_liter.unwrap() - 10.0 / 0.95).abs() < TOL);
    }

    #[test]
    fn test_scenario_11_hardener_total_percentage_readonly() {
        // 场景11: 固化剂毛占比只读, 直接编辑应拒绝且状态不变
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();
        let before = system.hardener.as_ref().unwrap().items[0].clone();

        let result = engine.update_item(
            &mut system,
            ComponentTable::Hardener,
            1,
            EditField::TotalPercentage,
            "55",
            &catalog,
        );

        assert!(result.is_err(), "固化剂毛占比不可直接编辑");
        let after = &system.hardener.as_ref().unwrap().items[0];
        assert_eq!(after.total_percentage, before.total_percentage);
    }

    #[test]
    fn test_scenario_12_complement_invariant_across_edit_chain() {
        // 场景12: 连续编辑后补数不变式始终成立
        // (固化剂净占比保持合计 100, 补数不变式才是严格意义上的恒等式)
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        let edits: [(ComponentTable, i32, EditField, &str); 4] = [
            (ComponentTable::Base, 1, EditField::TotalPercentage, "55"),
            (ComponentTable::Base, 2, EditField::Percentage, "35"),
            (ComponentTable::Hardener, 1, EditField::Percentage, "100"),
            (ComponentTable::Base, 2, EditField::TotalPercentage, "25"),
        ];
        for (table, seq, field, value) in edits {
            engine
                .update_item(&mut system, table, seq, field, value, &catalog)
                .unwrap();
            assert_complement_invariant(&system);
        }
    }

    #[test]
    fn test_scenario_13_out_of_range_rejected_state_unchanged() {
        // 场景13: 占比超出 [0,100] 被拒绝, 体系保持原状
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();
        let before = system.clone();

        let result = engine.update_item(
            &mut system,
            ComponentTable::Base,
            1,
            EditField::TotalPercentage,
            "150",
            &catalog,
        );

        assert!(result.is_err());
        assert_eq!(
            system.base.items[0].total_percentage,
            before.base.items[0].total_percentage
        );
    }

    // ==========================================
    // 第四部分：列合计缩放（规则 4）
    // ==========================================

    #[test]
    fn test_scenario_14_rule4_bulk_rescale() {
        // 场景14: 规则4 - 主漆列合计缩放到 70, 固化剂补数变 30
        let engine = RecipeRecalcEngine::new();
        let catalog = catalog();
        let mut system = two_part_system();

        engine
            .rescale_column_total(&mut system, ComponentTable::Base, 70.0, &catalog)
            .unwrap();

        // tp_i = pct_i/100 × 70 = 35/35
        assert!((system.base.items[0].total_percentage.unwrap() - 35.0).abs() < TOL);
        assert!((system.base.items[1].total_percentage.unwrap() - 35.0).abs() < TOL);
        // 净占比归一化回 50/50
        assert!((system.base.items[0].percentage.unwrap() - 50.0).abs() < TOL);
        assert_complement_invariant(&system);
        let h = system.hardener.as_ref().unwrap();
        assert!((h.items[0].total_percentage.unwrap() - 30.0).abs() < TOL);
    }

    // ==========================================
    // 第五部分：单组分编辑
    // ==========================================

    #[test]
    fn test_scenario_15_single_update_no_cross_propagation() {
        // 场景15: 单组分编辑只覆盖本行, 不触发跨行联动
        let engine = RecipeRecalcEngine::new();
        let mut f = Formulation::new("FP-001");
        f.items.push(item("RM-R", 1, 60.0, 0.0));
        f.items.push(item("RM-E", 2, 40.0, 0.0));

        engine
            .update_item_single(&mut f, 1, EditField::Percentage, "55")
            .unwrap();

        assert_eq!(f.items[0].percentage, Some(55.0));
        assert_eq!(f.items[1].percentage, Some(40.0), "其它行不受影响");
    }
}
