// ==========================================
// 汽车工厂能效决策支持系统 - 整改领域模型
// ==========================================
// 职责: 整改工单 / 财务影响 / 排序条目
// 红线: 工单由整改规划引擎独占创建, work_order_id
//       是追踪/通知协作方唯一可用的外部引用
// ==========================================

use crate::domain::types::{AnomalyType, Severity, WorkOrderStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// FinancialImpact - 财务影响
// ==========================================
// 不变式: cost_per_day = cost_per_hour × 24
//         cost_per_year = cost_per_hour × 8760 (精确值)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialImpact {
    pub waste_kwh_per_hour: f64, // 估算浪费电量 (kWh/h)
    pub cost_per_hour: f64,      // 每小时成本
    pub cost_per_day: f64,       // 每日成本
    pub cost_per_year: f64,      // 年化成本
}

impl FinancialImpact {
    /// 由浪费电量与单位电价计算财务影响
    ///
    /// # 参数
    /// - waste_kwh_per_hour: 估算浪费电量 (kWh/h)
    /// - unit_cost_per_kwh: 单位电价 (货币/kWh)
    pub fn from_waste(waste_kwh_per_hour: f64, unit_cost_per_kwh: f64) -> Self {
        let cost_per_hour = waste_kwh_per_hour * unit_cost_per_kwh;
        Self {
            waste_kwh_per_hour,
            cost_per_hour,
            cost_per_day: cost_per_hour * 24.0,
            cost_per_year: cost_per_hour * 24.0 * 365.0,
        }
    }
}

// ==========================================
// RemediationPlan - 整改工单
// ==========================================
// 生命周期: 由整改规划引擎创建 (OPEN), 状态流转由追踪协作方执行,
//           排序引擎只读 OPEN/IN_PROGRESS/BLOCKED 子集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub work_order_id: String,        // WO-<UTC日期>-<进程内单调序号>
    pub anomaly_type: AnomalyType,    // 关联异常类型
    pub zone_id: String,              // 区域
    pub severity: Severity,           // 严重度 (基础严重度 + 财务升级)
    pub impact: FinancialImpact,      // 财务影响
    pub fix_steps: Vec<String>,       // 处置步骤 (有序)
    pub assigned_team: String,        // 责任班组
    pub detected_at: NaiveDateTime,   // 异常检出时间
    pub deadline: NaiveDateTime,      // 处置期限 (检出时间 + 严重度时限)
    pub status: WorkOrderStatus,      // 工单状态
    pub created_at: NaiveDateTime,    // 工单创建时间
}

// ==========================================
// PriorityEntry - 排序条目
// ==========================================
// 口径: 每次排序请求重算,不持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub plan: RemediationPlan,
    pub priority_score: f64, // 年化成本 × 严重度权重
}

// ==========================================
// NotificationPayload - 通知载荷
// ==========================================
// 红线: 引擎只产出载荷,投递由通知协作方负责
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub work_order_id: String,
    pub text: String,                  // 面向操作人员的纯文本摘要
    pub structured: serde_json::Value, // 结构化摘要 (供下游系统解析)
}
