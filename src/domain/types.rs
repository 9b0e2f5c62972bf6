// ==========================================
// 涂料配方开发系统 - 领域类型定义
// ==========================================
// 子类别决定计算口径: 颜填料走 PVC 分子, 树脂走 PVC 分母
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 原材料子类别 (Subcategory)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subcategory {
    General,  // 通用 (溶剂/助剂等)
    Resin,    // 树脂 (成膜物, PVC 分母)
    Extender, // 颜填料 (PVC 分子)
    Hardener, // 固化剂
    Base,     // 主漆
}

impl Default for Subcategory {
    fn default() -> Self {
        Subcategory::General
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcategory::General => write!(f, "GENERAL"),
            Subcategory::Resin => write!(f, "RESIN"),
            Subcategory::Extender => write!(f, "EXTENDER"),
            Subcategory::Hardener => write!(f, "HARDENER"),
            Subcategory::Base => write!(f, "BASE"),
        }
    }
}

impl FromStr for Subcategory {
    type Err = String;

    /// 解析数据库/导入文件中的子类别值（大小写不敏感）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GENERAL" | "" => Ok(Subcategory::General),
            "RESIN" => Ok(Subcategory::Resin),
            "EXTENDER" => Ok(Subcategory::Extender),
            "HARDENER" => Ok(Subcategory::Hardener),
            "BASE" => Ok(Subcategory::Base),
            other => Err(format!("未知子类别: {}", other)),
        }
    }
}

// ==========================================
// 配方状态 (Recipe Status)
// ==========================================
// Completed: |Σpercentage - 100| < 容差
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeStatus {
    Completed,  // 完整配方
    Incomplete, // 草稿/不完整
}

impl fmt::Display for RecipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeStatus::Completed => write!(f, "COMPLETED"),
            RecipeStatus::Incomplete => write!(f, "INCOMPLETE"),
        }
    }
}

impl FromStr for RecipeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMPLETED" => Ok(RecipeStatus::Completed),
            "INCOMPLETE" => Ok(RecipeStatus::Incomplete),
            other => Err(format!("未知配方状态: {}", other)),
        }
    }
}

// ==========================================
// 双组分表标识 (Component Table)
// ==========================================
// 红线: 主漆驱动固化剂, 固化剂永远不反向驱动主漆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentTable {
    Base,     // 主漆表
    Hardener, // 固化剂表
}

impl fmt::Display for ComponentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentTable::Base => write!(f, "BASE"),
            ComponentTable::Hardener => write!(f, "HARDENER"),
        }
    }
}

// ==========================================
// 可编辑字段 (Edit Field)
// ==========================================
// 固化剂行仅 Percentage / WaitingTime 可编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditField {
    Percentage,      // 净配方占比
    TotalPercentage, // 毛批次占比
    WaitingTime,     // 等待时间(分钟)
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditField::Percentage => write!(f, "PERCENTAGE"),
            EditField::TotalPercentage => write!(f, "TOTAL_PERCENTAGE"),
            EditField::WaitingTime => write!(f, "WAITING_TIME"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcategory_parse() {
        assert_eq!("resin".parse::<Subcategory>().unwrap(), Subcategory::Resin);
        assert_eq!(
            "EXTENDER".parse::<Subcategory>().unwrap(),
            Subcategory::Extender
        );
        // 空值视为通用类
        assert_eq!("".parse::<Subcategory>().unwrap(), Subcategory::General);
        assert!("PIGMENT".parse::<Subcategory>().is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        let s = RecipeStatus::Completed;
        assert_eq!(s.to_string().parse::<RecipeStatus>().unwrap(), s);
    }
}
