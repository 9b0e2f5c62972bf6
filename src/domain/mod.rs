// ==========================================
// 涂料配方开发系统 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含计算规则
// ==========================================

pub mod formulation;
pub mod material;
pub mod types;

pub use formulation::{BomLine, Formulation, RecipeLineItem, RecipeSnapshot, TwoPartSystem};
pub use material::{
    DqLevel, DqSummary, DqViolation, ImportBatch, ImportOutcome, MaterialCatalog, RawMaterial,
    RawProductRecord,
};
