// ==========================================
// 汽车工厂能效决策支持系统 - 通知载荷生成
// ==========================================
// 职责: 整改工单 → 面向投递协作方的文本/结构化摘要
// 红线: 只产出载荷,不做任何投递; 文本走 i18n,
//       结构化部分字段口径对下游系统保持稳定
// ==========================================

use crate::domain::remediation::{NotificationPayload, RemediationPlan};
use crate::i18n::{t, t_with_args};
use serde_json::json;

// ==========================================
// NotificationFormatter - 通知载荷生成器
// ==========================================
pub struct NotificationFormatter {
    // 无状态引擎,不需要注入依赖
}

impl NotificationFormatter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 生成工单通知载荷
    ///
    /// # 返回
    /// NotificationPayload: 纯文本摘要 (当前 locale) + 结构化 JSON
    pub fn format(&self, plan: &RemediationPlan) -> NotificationPayload {
        let mut lines = Vec::new();
        lines.push(t_with_args(
            "notify.title",
            &[("severity", plan.severity.to_db_str())],
        ));
        lines.push(t_with_args("notify.work_order", &[("id", &plan.work_order_id)]));
        lines.push(t_with_args(
            "notify.anomaly",
            &[("anomaly", plan.anomaly_type.to_db_str())],
        ));
        lines.push(t_with_args("notify.zone", &[("zone", &plan.zone_id)]));
        lines.push(t_with_args(
            "notify.impact_day",
            &[("cost", &format!("{:.2}", plan.impact.cost_per_day))],
        ));
        lines.push(t_with_args(
            "notify.impact_year",
            &[("cost", &format!("{:.0}", plan.impact.cost_per_year))],
        ));
        lines.push(t("notify.steps_header"));
        for (i, step) in plan.fix_steps.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, step));
        }
        lines.push(t_with_args("notify.team", &[("team", &plan.assigned_team)]));
        lines.push(t_with_args(
            "notify.deadline",
            &[("deadline", &plan.deadline.format("%Y-%m-%d %H:%M").to_string())],
        ));

        let structured = json!({
            "work_order_id": plan.work_order_id,
            "anomaly_type": plan.anomaly_type.to_db_str(),
            "zone_id": plan.zone_id,
            "severity": plan.severity.to_db_str(),
            "cost_per_day": plan.impact.cost_per_day,
            "cost_per_year": plan.impact.cost_per_year,
            "fix_steps": plan.fix_steps,
            "assigned_team": plan.assigned_team,
            "deadline": plan.deadline.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "status": plan.status.to_db_str(),
        });

        NotificationPayload {
            work_order_id: plan.work_order_id.clone(),
            text: lines.join("\n"),
            structured,
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for NotificationFormatter {
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
    use crate::domain::remediation::FinancialImpact;
    use crate::domain::types::{AnomalyType, Severity, WorkOrderStatus};
    use chrono::NaiveDate;

    fn sample_plan() -> RemediationPlan {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        RemediationPlan {
            work_order_id: "WO-20260302-1001".to_string(),
            anomaly_type: AnomalyType::CompressedAirLeak,
            zone_id: "ZONE-ASSEMBLY".to_string(),
            severity: Severity::High,
            impact: FinancialImpact::from_waste(6.0, 0.07),
            fix_steps: vec!["定位泄漏点".to_string(), "更换密封件".to_string()],
            assigned_team: "维修班组".to_string(),
            detected_at: ts,
            deadline: ts + chrono::Duration::hours(2),
            status: WorkOrderStatus::Open,
            created_at: ts,
        }
    }

    #[test]
    fn test_payload_contains_work_order_and_steps() {
        let payload = NotificationFormatter::new().format(&sample_plan());

        assert_eq!(payload.work_order_id, "WO-20260302-1001");
        assert!(payload.text.contains("WO-20260302-1001"));
        assert!(payload.text.contains("1. 定位泄漏点"));
        assert!(payload.text.contains("2. 更换密封件"));
    }

    #[test]
    fn test_structured_payload_fields() {
        let payload = NotificationFormatter::new().format(&sample_plan());

        assert_eq!(payload.structured["anomaly_type"], "COMPRESSED_AIR_LEAK");
        assert_eq!(payload.structured["severity"], "HIGH");
        assert_eq!(payload.structured["zone_id"], "ZONE-ASSEMBLY");
        assert_eq!(payload.structured["status"], "OPEN");
        assert_eq!(
            payload.structured["fix_steps"].as_array().unwrap().len(),
            2
        );
    }
}
