// ==========================================
// 汽车工厂能效决策支持系统 - 工单优先级排序引擎
// ==========================================
// 职责: 活动工单按财务影响 × 严重度权重排序
// 输入: 状态为 OPEN/IN_PROGRESS/BLOCKED 的整改工单集合
// 输出: PriorityEntry 有序序列 (每次请求重算,不持久化)
// 红线: 无状态引擎; limit/zone 过滤是排序后的纯后置过滤,
//       绝不影响排序计算本身; 排序键构成全序,
//       输入乱序不改变输出顺序
// ==========================================

use crate::domain::remediation::{PriorityEntry, RemediationPlan};
use crate::domain::types::Severity;
use std::cmp::Ordering;

// ==========================================
// PriorityRanker - 优先级排序引擎
// ==========================================
pub struct PriorityRanker {
    // 无状态引擎,不需要注入依赖
}

impl PriorityRanker {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 排序工单集合
    ///
    /// 排序键:
    /// 1) priority_score = cost_per_year × 严重度权重, 降序
    /// 2) deadline 升序 (更早到期优先)
    /// 3) work_order_id 升序 (保证全序,输入乱序不影响输出)
    ///
    /// # 参数
    /// - plans: 工单集合 (RESOLVED 在评分前剔除)
    /// - limit: 可选 top-N (后置过滤)
    /// - zone_filter: 可选区域过滤 (后置过滤)
    pub fn rank(
        &self,
        plans: Vec<RemediationPlan>,
        limit: Option<usize>,
        zone_filter: Option<&str>,
    ) -> Vec<PriorityEntry> {
        // 评分仅覆盖活动工单
        let mut entries: Vec<PriorityEntry> = plans
            .into_iter()
            .filter(|p| p.status.is_active())
            .map(|plan| {
                let priority_score =
                    plan.impact.cost_per_year * Self::severity_multiplier(plan.severity);
                PriorityEntry {
                    plan,
                    priority_score,
                }
            })
            .collect();

        entries.sort_by(|a, b| Self::compare(a, b));

        // 后置过滤: 先区域再 top-N, 均不影响上面的排序计算
        let filtered: Vec<PriorityEntry> = match zone_filter {
            Some(zone) => entries
                .into_iter()
                .filter(|e| e.plan.zone_id == zone)
                .collect(),
            None => entries,
        };

        match limit {
            Some(n) => filtered.into_iter().take(n).collect(),
            None => filtered,
        }
    }

    /// 严重度权重 (HIGH ×3, MEDIUM ×1.5, LOW ×1)
    pub fn severity_multiplier(severity: Severity) -> f64 {
        match severity {
            Severity::High => 3.0,
            Severity::Medium => 1.5,
            Severity::Low => 1.0,
        }
    }

    /// 比较两个排序条目
    ///
    /// # 返回
    /// Ordering::Less 表示 a 优先于 b
    fn compare(a: &PriorityEntry, b: &PriorityEntry) -> Ordering {
        // 1. 评分降序
        match b
            .priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => {}
            other => return other,
        }

        // 2. 期限升序
        match a.plan.deadline.cmp(&b.plan.deadline) {
            Ordering::Equal => {}
            other => return other,
        }

        // 3. 工单号升序 (全序兜底)
        a.plan.work_order_id.cmp(&b.plan.work_order_id)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for PriorityRanker {
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
    use crate::domain::types::{AnomalyType, WorkOrderStatus};
    use chrono::NaiveDate;

    fn ts(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn plan(
        id: &str,
        zone: &str,
        severity: Severity,
        cost_per_year: f64,
        deadline_hour: u32,
        status: WorkOrderStatus,
    ) -> RemediationPlan {
        RemediationPlan {
            work_order_id: id.to_string(),
            anomaly_type: AnomalyType::PaintOvenIdle,
            zone_id: zone.to_string(),
            severity,
            impact: FinancialImpact {
                waste_kwh_per_hour: cost_per_year / 8760.0,
                cost_per_hour: cost_per_year / 8760.0,
                cost_per_day: cost_per_year / 365.0,
                cost_per_year,
            },
            fix_steps: vec!["检查".to_string()],
            assigned_team: "维修班组".to_string(),
            detected_at: ts(8),
            deadline: ts(deadline_hour),
            status,
            created_at: ts(9),
        }
    }

    #[test]
    fn test_severity_weight_beats_raw_cost() {
        // HIGH 1000 (加权 3000) 排在 LOW 2500 (加权 2500) 之前
        let ranker = PriorityRanker::new();
        let entries = ranker.rank(
            vec![
                plan("WO-1", "Z1", Severity::Low, 2500.0, 12, WorkOrderStatus::Open),
                plan("WO-2", "Z1", Severity::High, 1000.0, 12, WorkOrderStatus::Open),
            ],
            None,
            None,
        );

        assert_eq!(entries[0].plan.work_order_id, "WO-2");
        assert_eq!(entries[0].priority_score, 3000.0);
        assert_eq!(entries[1].priority_score, 2500.0);
    }

    #[test]
    fn test_stable_under_input_permutation() {
        let ranker = PriorityRanker::new();
        let plans = vec![
            plan("WO-3", "Z1", Severity::Medium, 2000.0, 12, WorkOrderStatus::Open),
            plan("WO-1", "Z2", Severity::High, 1000.0, 12, WorkOrderStatus::Open),
            plan("WO-2", "Z3", Severity::Low, 3000.0, 10, WorkOrderStatus::Open),
        ];

        let forward: Vec<String> = ranker
            .rank(plans.clone(), None, None)
            .into_iter()
            .map(|e| e.plan.work_order_id)
            .collect();

        let mut reversed_input = plans;
        reversed_input.reverse();
        let backward: Vec<String> = ranker
            .rank(reversed_input, None, None)
            .into_iter()
            .map(|e| e.plan.work_order_id)
            .collect();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_tie_broken_by_earliest_deadline() {
        let ranker = PriorityRanker::new();
        let entries = ranker.rank(
            vec![
                plan("WO-B", "Z1", Severity::High, 1000.0, 14, WorkOrderStatus::Open),
                plan("WO-A", "Z1", Severity::High, 1000.0, 10, WorkOrderStatus::Open),
            ],
            None,
            None,
        );
        assert_eq!(entries[0].plan.work_order_id, "WO-A");
    }

    #[test]
    fn test_resolved_excluded_before_scoring() {
        let ranker = PriorityRanker::new();
        let entries = ranker.rank(
            vec![
                plan("WO-1", "Z1", Severity::High, 9000.0, 12, WorkOrderStatus::Resolved),
                plan("WO-2", "Z1", Severity::Low, 100.0, 12, WorkOrderStatus::Open),
                plan("WO-3", "Z1", Severity::Low, 200.0, 12, WorkOrderStatus::Blocked),
            ],
            None,
            None,
        );
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.plan.status.is_active()));
    }

    #[test]
    fn test_limit_and_zone_are_post_filters() {
        let ranker = PriorityRanker::new();
        let plans = vec![
            plan("WO-1", "Z1", Severity::High, 5000.0, 12, WorkOrderStatus::Open),
            plan("WO-2", "Z2", Severity::High, 4000.0, 12, WorkOrderStatus::Open),
            plan("WO-3", "Z2", Severity::Low, 3000.0, 12, WorkOrderStatus::Open),
            plan("WO-4", "Z2", Severity::Low, 100.0, 12, WorkOrderStatus::Open),
        ];

        // 区域过滤后仍保持全局排序的相对顺序
        let z2: Vec<String> = ranker
            .rank(plans.clone(), None, Some("Z2"))
            .into_iter()
            .map(|e| e.plan.work_order_id)
            .collect();
        assert_eq!(z2, vec!["WO-2", "WO-3", "WO-4"]);

        // top-N 在过滤后截断
        let top2: Vec<String> = ranker
            .rank(plans, Some(2), Some("Z2"))
            .into_iter()
            .map(|e| e.plan.work_order_id)
            .collect();
        assert_eq!(top2, vec!["WO-2", "WO-3"]);
    }
}
