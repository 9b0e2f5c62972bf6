// ==========================================
// 涂料配方开发系统 - 数据仓储层
// ==========================================
// 职责: 数据访问, 不含业务逻辑
// 红线: 配方快照只被取代 (is_current 清零), 永不删除
// ==========================================

pub mod bom_repo;
pub mod error;
pub mod material_repo;
pub mod recipe_repo;

pub use bom_repo::{BomRepository, BomSource};
pub use error::{RepositoryError, RepositoryResult};
pub use material_repo::MasterProductRepository;
pub use recipe_repo::RecipeRepository;
