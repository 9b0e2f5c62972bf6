// ==========================================
// 涂料配方开发系统 - API 层
// ==========================================
// 职责: 面向前端的业务接口 (加载/编辑/保存配方)
// 红线: 校验失败即中止, 先前状态保持不变; 所有错误必须带显式原因
// ==========================================

pub mod error;
pub mod formulation_api;
pub mod validator;

pub use error::{ApiError, ApiResult, ValidationViolation};
pub use formulation_api::{FormulationApi, LoadSource, LoadedFormulation, MetricsBundle, SaveOutcome};
pub use validator::SaveValidator;
