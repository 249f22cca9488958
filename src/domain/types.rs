// ==========================================
// 汽车工厂能效决策支持系统 - 领域类型定义
// ==========================================
// 职责: 核心枚举类型与编码规则
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库/遥测文件一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 异常类型 (Anomaly Type)
// ==========================================
// 红线: 规则判定按固定优先级顺序,同一读数只产生一条规则异常
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    PaintOvenIdle,            // 喷漆烘炉空转
    CompressedAirLeak,        // 压缩空气泄漏
    HvacOvercooling,          // 空调过度制冷
    HvacInefficiency,         // 空调能效异常
    StandbyPowerExcessive,    // 待机功耗超标
    ProductionEfficiencyDrop, // 单位能耗劣化
    ModelDetected,            // 模型检出(无对应规则)
}

impl AnomalyType {
    /// 规则判定优先级 (数值越小优先级越高)
    ///
    /// 用途: 同一 (zone, timestamp) 出现多条规则命中时的决胜键
    pub fn rule_priority(&self) -> u8 {
        match self {
            AnomalyType::PaintOvenIdle => 1,
            AnomalyType::CompressedAirLeak => 2,
            AnomalyType::HvacOvercooling => 3,
            AnomalyType::HvacInefficiency => 4,
            AnomalyType::StandbyPowerExcessive => 5,
            AnomalyType::ProductionEfficiencyDrop => 6,
            AnomalyType::ModelDetected => 7,
        }
    }

    /// 从字符串解析异常类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PAINT_OVEN_IDLE" => Some(AnomalyType::PaintOvenIdle),
            "COMPRESSED_AIR_LEAK" => Some(AnomalyType::CompressedAirLeak),
            "HVAC_OVERCOOLING" => Some(AnomalyType::HvacOvercooling),
            "HVAC_INEFFICIENCY" => Some(AnomalyType::HvacInefficiency),
            "STANDBY_POWER_EXCESSIVE" => Some(AnomalyType::StandbyPowerExcessive),
            "PRODUCTION_EFFICIENCY_DROP" => Some(AnomalyType::ProductionEfficiencyDrop),
            "MODEL_DETECTED" => Some(AnomalyType::ModelDetected),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AnomalyType::PaintOvenIdle => "PAINT_OVEN_IDLE",
            AnomalyType::CompressedAirLeak => "COMPRESSED_AIR_LEAK",
            AnomalyType::HvacOvercooling => "HVAC_OVERCOOLING",
            AnomalyType::HvacInefficiency => "HVAC_INEFFICIENCY",
            AnomalyType::StandbyPowerExcessive => "STANDBY_POWER_EXCESSIVE",
            AnomalyType::ProductionEfficiencyDrop => "PRODUCTION_EFFICIENCY_DROP",
            AnomalyType::ModelDetected => "MODEL_DETECTED",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 异常来源 (Anomaly Source)
// ==========================================
// RULE: 阈值规则命中 (confidence 恒为 1.0)
// MODEL: 外部离群模型命中 (confidence = 模型评分)
// FUSED: 两者在同一 (zone, timestamp) 上达成一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalySource {
    Rule,
    Model,
    Fused,
}

impl fmt::Display for AnomalySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalySource::Rule => write!(f, "RULE"),
            AnomalySource::Model => write!(f, "MODEL"),
            AnomalySource::Fused => write!(f, "FUSED"),
        }
    }
}

// ==========================================
// 整改严重度 (Severity)
// ==========================================
// 顺序: Low < Medium < High (用于升级判定)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// 升高一级 (High 封顶)
    ///
    /// 用途: 年化财务影响超过高影响阈值时的严重度升级
    pub fn escalated(&self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High => Severity::High,
        }
    }

    /// 从字符串解析严重度
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 状态机: OPEN → IN_PROGRESS → RESOLVED, 活动状态可进入 BLOCKED
// 终态: RESOLVED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    Blocked,
    Resolved,
}

impl WorkOrderStatus {
    /// 判断是否允许转换到目标状态
    ///
    /// 规则:
    /// - OPEN → IN_PROGRESS / BLOCKED
    /// - IN_PROGRESS → RESOLVED / BLOCKED
    /// - BLOCKED → OPEN / IN_PROGRESS
    /// - RESOLVED 为终态,不允许任何转换
    pub fn can_transition_to(&self, target: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, target),
            (Open, InProgress)
                | (Open, Blocked)
                | (InProgress, Resolved)
                | (InProgress, Blocked)
                | (Blocked, Open)
                | (Blocked, InProgress)
        )
    }

    /// 是否属于排序引擎可见的活动状态 (OPEN/IN_PROGRESS/BLOCKED)
    pub fn is_active(&self) -> bool {
        !matches!(self, WorkOrderStatus::Resolved)
    }

    /// 从字符串解析工单状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(WorkOrderStatus::Open),
            "IN_PROGRESS" => Some(WorkOrderStatus::InProgress),
            "BLOCKED" => Some(WorkOrderStatus::Blocked),
            "RESOLVED" => Some(WorkOrderStatus::Resolved),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "OPEN",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Blocked => "BLOCKED",
            WorkOrderStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 班次 (Shift Code)
// ==========================================
// 遥测文件口径: SHIFT-A / SHIFT-B / SHIFT-C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    #[serde(rename = "SHIFT-A")]
    A,
    #[serde(rename = "SHIFT-B")]
    B,
    #[serde(rename = "SHIFT-C")]
    C,
}

impl ShiftCode {
    /// 模型特征编码 (特征向量口径: A=0, B=1, C=2)
    pub fn encoded(&self) -> f64 {
        match self {
            ShiftCode::A => 0.0,
            ShiftCode::B => 1.0,
            ShiftCode::C => 2.0,
        }
    }

    /// 从字符串解析班次 (兼容 "SHIFT-A" 与 "A" 两种写法)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHIFT-A" | "A" => Some(ShiftCode::A),
            "SHIFT-B" | "B" => Some(ShiftCode::B),
            "SHIFT-C" | "C" => Some(ShiftCode::C),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftCode::A => "SHIFT-A",
            ShiftCode::B => "SHIFT-B",
            ShiftCode::C => "SHIFT-C",
        }
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 区域运行状态 (Zone Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneStatus {
    Operational, // 生产运行
    Standby,     // 待机
    Maintenance, // 检修
}

impl ZoneStatus {
    /// 从字符串解析运行状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPERATIONAL" => Some(ZoneStatus::Operational),
            "STANDBY" => Some(ZoneStatus::Standby),
            "MAINTENANCE" => Some(ZoneStatus::Maintenance),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ZoneStatus::Operational => "OPERATIONAL",
            ZoneStatus::Standby => "STANDBY",
            ZoneStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
