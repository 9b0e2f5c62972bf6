// ==========================================
// 涂料配方开发系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 配方计算引擎 (百分比/重量换算、密度、PVC/CPVC/SVR、成本)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 配方计算规则
pub mod engine;

// 导入层 - 主产品档案导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ComponentTable, EditField, RecipeStatus, Subcategory};

// 领域实体
pub use domain::{
    BomLine, Formulation, MaterialCatalog, RawMaterial, RecipeLineItem, RecipeSnapshot,
    TwoPartSystem,
};

// 引擎
pub use engine::{BomNormalizer, FormulationMetrics, MetricsEngine, RecipeRecalcEngine};

// API
pub use api::FormulationApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "涂料配方开发系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
