// ==========================================
// 涂料配方开发系统 - 配方领域模型
// ==========================================
// 红线: 固化剂表的 percentage/total_percentage 永远由主漆派生,
//       代码中不得把固化剂字段当作独立权威数据
// ==========================================

use crate::domain::types::RecipeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RecipeLineItem - 配方行
// ==========================================
// percentage: 净配方内占比 (组分表内合计 100)
// total_percentage: 毛批次占比 (主漆+固化剂合计 100, 减去另行记录的水分)
// None 表示用户尚未录入; 聚合计算一律按 0 参与
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLineItem {
    pub material_id: String,           // 关联 master_product
    pub percentage: Option<f64>,       // 净配方占比 (0-100)
    pub total_percentage: Option<f64>, // 毛批次占比 (0-100)
    pub wt_per_liter: Option<f64>,     // 升料重 = total_percentage / 有效密度
    pub sequence: i32,                 // 投料顺序 (1 起始, 配方内唯一)
    pub waiting_time_min: i32,         // 投料后等待时间 (分钟)
}

impl RecipeLineItem {
    /// 新增空行（刚选中原材料、尚未录入占比）
    pub fn new(material_id: &str, sequence: i32) -> Self {
        Self {
            material_id: material_id.to_string(),
            percentage: None,
            total_percentage: None,
            wt_per_liter: None,
            sequence,
            waiting_time_min: 0,
        }
    }

    /// 聚合口径: 未录入按 0 参与
    pub fn percentage_or_zero(&self) -> f64 {
        self.percentage.unwrap_or(0.0)
    }

    pub fn total_percentage_or_zero(&self) -> f64 {
        self.total_percentage.unwrap_or(0.0)
    }
}

// ==========================================
// Formulation - 单组分配方
// ==========================================
// 生命周期: 首次加行时创建 → 交互编辑 → 保存为新快照 (取代旧快照)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formulation {
    pub master_product_id: String,   // 所属成品
    pub items: Vec<RecipeLineItem>,  // 配方行 (顺序即投料顺序)
    pub mixing_ratio_part: f64,      // 双组分混合比中本组分的份数 (如 4:1 中的 4)
}

impl Formulation {
    pub fn new(master_product_id: &str) -> Self {
        Self {
            master_product_id: master_product_id.to_string(),
            items: Vec::new(),
            mixing_ratio_part: 0.0,
        }
    }

    /// 净配方占比合计
    pub fn percentage_sum(&self) -> f64 {
        self.items.iter().map(|i| i.percentage_or_zero()).sum()
    }

    /// 毛批次占比合计
    pub fn total_percentage_sum(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.total_percentage_or_zero())
            .sum()
    }

    pub fn find_item(&self, material_id: &str) -> Option<&RecipeLineItem> {
        self.items.iter().find(|i| i.material_id == material_id)
    }

    /// 按当前列表顺序重排 sequence (1 起始)
    pub fn renumber(&mut self) {
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.sequence = (idx + 1) as i32;
        }
    }
}

// ==========================================
// TwoPartSystem - 双组分体系 (主漆 + 固化剂)
// ==========================================
// 不变式: Σ hardener.total_percentage == 100 − Σ base.total_percentage
//         (容差 0.01, 由 RecipeRecalcEngine::resync_hardener 维护)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoPartSystem {
    pub base: Formulation,
    pub hardener: Option<Formulation>,
    pub base_ratio: f64,     // 混合比主漆份数
    pub hardener_ratio: f64, // 混合比固化剂份数
}

impl TwoPartSystem {
    /// 仅主漆的体系 (未关联固化剂)
    pub fn single(base: Formulation) -> Self {
        Self {
            base,
            hardener: None,
            base_ratio: 0.0,
            hardener_ratio: 0.0,
        }
    }

    pub fn with_hardener(
        base: Formulation,
        hardener: Formulation,
        base_ratio: f64,
        hardener_ratio: f64,
    ) -> Self {
        Self {
            base,
            hardener: Some(hardener),
            base_ratio,
            hardener_ratio,
        }
    }

    /// 固化剂应占的毛批次合计 (主漆合计的补数)
    pub fn expected_hardener_total(&self) -> f64 {
        100.0 - self.base.total_percentage_sum()
    }
}

// ==========================================
// BomLine - BOM 标准配方行
// ==========================================
// 用途: 无保存配方时的回退来源; percentage_required 可能是小数形式
//       (合计 ≤ 1.05 时引擎统一 ×100 归一化)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    pub raw_material_id: String,
    pub percentage_required: f64,
    pub sequence: Option<i32>,
    pub waiting_time_min: Option<i32>,
}

// ==========================================
// RecipeSnapshot - 配方快照 (持久化形态)
// ==========================================
// 生命周期: 保存即新快照; 旧快照 is_current 清零, 不删除
// 对齐: recipe_snapshot / recipe_item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSnapshot {
    pub snapshot_id: String, // UUID
    pub master_product_id: String,
    pub density: f64,                  // 保存时的成品密度
    pub viscosity: Option<f64>,        // 黏度 (保留字段)
    pub water_pct: Option<f64>,        // 批次外加水占比
    pub mixing_ratio_part: Option<f64>,
    pub status: RecipeStatus,          // Completed iff |Σpercentage−100| < 容差
    pub items: Vec<RecipeLineItem>,    // 按 sequence 升序
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
