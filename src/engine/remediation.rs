// ==========================================
// 汽车工厂能效决策支持系统 - 整改规划引擎
// ==========================================
// 职责: 异常记录 → 成本化、定级、可追踪的整改工单
// 输入: AnomalyRecord + 整改手册 + 规划配置
// 输出: RemediationPlan (每条异常恰好一张工单)
// 红线: 未映射异常类型硬失败 (UnknownAnomalyType),
//       绝不静默编造通用方案掩盖检测器与手册间的配置缺口;
//       work_order_id 由注入的序号生成器独占产生
// ==========================================

use crate::config::{PlannerConfig, RemediationPlaybook};
use crate::domain::anomaly::AnomalyRecord;
use crate::domain::remediation::{FinancialImpact, RemediationPlan};
use crate::domain::types::{AnomalyType, WorkOrderStatus};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ==========================================
// 工单号生成
// ==========================================

/// 工单号生成接口
///
/// 注入式设计: 生产用原子序号生成器,测试注入确定性实现,
/// 同进程多引擎实例互不冲突
pub trait WorkOrderIdGenerator: Send + Sync {
    /// 产生下一个工单号 (进程生命周期内保证唯一)
    fn next_id(&self, now_utc: NaiveDateTime) -> String;
}

/// 日期 + 单调序号生成器
///
/// 格式: WO-<UTC日期YYYYMMDD>-<4位序号>
/// 已知限制: 序号进程重启后复位,跨重启唯一性由日期段与
/// 工单表唯一约束兜底 (冲突视为缺陷上报,不自动纠正)
pub struct DateSequenceGenerator {
    counter: AtomicU64,
}

impl DateSequenceGenerator {
    /// 从默认起始序号 (1000) 创建
    pub fn new() -> Self {
        Self::starting_at(1000)
    }

    /// 从指定序号创建 (测试用)
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl Default for DateSequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkOrderIdGenerator for DateSequenceGenerator {
    fn next_id(&self, now_utc: NaiveDateTime) -> String {
        // fetch_add 保证并发规划时序号不重复
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("WO-{}-{:04}", now_utc.format("%Y%m%d"), seq)
    }
}

// ==========================================
// RemediationPlanner - 整改规划引擎
// ==========================================
pub struct RemediationPlanner {
    config: PlannerConfig,
    playbook: RemediationPlaybook,
    id_generator: Arc<dyn WorkOrderIdGenerator>,
}

impl RemediationPlanner {
    /// 构造函数
    ///
    /// # 参数
    /// - config: 规划配置 (电价/阈值/时限表,全部外置可配)
    /// - playbook: 整改手册 (数据驱动映射,配置资产)
    /// - id_generator: 工单号生成器 (注入式)
    pub fn new(
        config: PlannerConfig,
        playbook: RemediationPlaybook,
        id_generator: Arc<dyn WorkOrderIdGenerator>,
    ) -> Self {
        Self {
            config,
            playbook,
            id_generator,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为单条异常生成整改工单
    ///
    /// # 参数
    /// - anomaly: 异常记录 (只读消费)
    /// - now_utc: 当前时间 (工单创建时间与处置期限的基准,外部注入保证可测)
    ///
    /// # 返回
    /// - Ok(RemediationPlan): 恰好一张 OPEN 工单
    /// - Err(UnknownAnomalyType): 手册无映射 (逐异常失败,不影响批次内其他异常)
    pub fn plan(
        &self,
        anomaly: &AnomalyRecord,
        now_utc: NaiveDateTime,
    ) -> EngineResult<RemediationPlan> {
        // === 步骤 1: 手册查找 (无映射硬失败) ===
        let entry = self
            .playbook
            .lookup(anomaly.anomaly_type)
            .ok_or_else(|| {
                tracing::error!(
                    anomaly_type = %anomaly.anomaly_type,
                    zone = %anomaly.zone_id,
                    "整改手册缺失条目,异常无法规划"
                );
                EngineError::UnknownAnomalyType(anomaly.anomaly_type.to_string())
            })?;

        // === 步骤 2: 浪费电量估算 + 财务影响 ===
        let waste_kwh = self.estimate_waste_kwh(anomaly);
        let impact = FinancialImpact::from_waste(waste_kwh, self.config.unit_cost_per_kwh);

        // === 步骤 3: 严重度判定 (基础严重度 + 财务升级) ===
        let mut severity = entry.severity_base;
        if impact.cost_per_year > self.config.high_impact_cost_per_year {
            severity = severity.escalated();
        }

        // === 步骤 4: 期限与工单号 ===
        let deadline =
            now_utc + ChronoDuration::hours(self.config.deadline.hours_for(severity));
        let work_order_id = self.id_generator.next_id(now_utc);

        tracing::info!(
            work_order_id = %work_order_id,
            anomaly_type = %anomaly.anomaly_type,
            zone = %anomaly.zone_id,
            severity = %severity,
            cost_per_year = impact.cost_per_year,
            "生成整改工单"
        );

        Ok(RemediationPlan {
            work_order_id,
            anomaly_type: anomaly.anomaly_type,
            zone_id: anomaly.zone_id.clone(),
            severity,
            impact,
            fix_steps: entry.fix_steps.clone(),
            assigned_team: entry.assigned_team.clone(),
            detected_at: anomaly.timestamp,
            deadline,
            status: WorkOrderStatus::Open,
            created_at: now_utc,
        })
    }

    // ==========================================
    // 浪费电量估算 (按异常类型)
    // ==========================================

    /// 估算每小时浪费电量 (kWh/h)
    ///
    /// 口径 (系数全部来自配置):
    /// - 喷漆空转: 命中时段全部电耗均为浪费
    /// - 空气泄漏: 气耗 × 折算电耗系数
    /// - 空调类: 基准空调电耗 × 可节约比例
    /// - 待机超标: 命中电耗扣除允许待机部分
    /// - 劣化/模型检出: 命中电耗 × 超耗比例
    fn estimate_waste_kwh(&self, anomaly: &AnomalyRecord) -> f64 {
        let snapshot = &anomaly.snapshot;
        let waste = match anomaly.anomaly_type {
            AnomalyType::PaintOvenIdle => snapshot.energy_kwh,
            AnomalyType::CompressedAirLeak => {
                snapshot.compressed_air_m3 * self.config.air_to_kwh_factor
            }
            AnomalyType::HvacOvercooling | AnomalyType::HvacInefficiency => {
                self.config.hvac_est_kwh_per_hour * self.config.hvac_savings_fraction
            }
            AnomalyType::StandbyPowerExcessive => {
                snapshot.energy_kwh * (1.0 - self.config.standby_allowed_fraction)
            }
            AnomalyType::ProductionEfficiencyDrop | AnomalyType::ModelDetected => {
                snapshot.energy_kwh * self.config.model_excess_fraction
            }
        };
        waste.max(0.0)
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anomaly::MetricSnapshot;
    use crate::domain::types::{AnomalySource, Severity};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn anomaly(anomaly_type: AnomalyType, energy: f64) -> AnomalyRecord {
        AnomalyRecord {
            anomaly_id: Uuid::new_v4().to_string(),
            zone_id: "ZONE-PAINT-SHOP".to_string(),
            timestamp: now() - ChronoDuration::hours(1),
            anomaly_type,
            source: AnomalySource::Rule,
            confidence: 1.0,
            snapshot: MetricSnapshot {
                energy_kwh: energy,
                production_units: 0,
                temperature_c: Some(22.0),
                compressed_air_m3: 60.0,
            },
            note: "测试异常".to_string(),
        }
    }

    fn planner() -> RemediationPlanner {
        RemediationPlanner::new(
            PlannerConfig::default(),
            RemediationPlaybook::default(),
            Arc::new(DateSequenceGenerator::new()),
        )
    }

    #[test]
    fn test_plan_basic_fields() {
        let plan = planner()
            .plan(&anomaly(AnomalyType::PaintOvenIdle, 200.0), now())
            .unwrap();

        assert_eq!(plan.anomaly_type, AnomalyType::PaintOvenIdle);
        assert_eq!(plan.zone_id, "ZONE-PAINT-SHOP");
        assert_eq!(plan.status, WorkOrderStatus::Open);
        assert!(!plan.fix_steps.is_empty());
        assert_eq!(plan.assigned_team, "维修班组");
        // 喷漆空转: 全部命中电耗计为浪费
        assert_eq!(plan.impact.waste_kwh_per_hour, 200.0);
    }

    #[test]
    fn test_financial_year_invariant() {
        let plan = planner()
            .plan(&anomaly(AnomalyType::PaintOvenIdle, 123.0), now())
            .unwrap();
        assert_eq!(plan.impact.cost_per_year, plan.impact.cost_per_hour * 8760.0);
    }

    #[test]
    fn test_severity_escalation_on_high_impact() {
        // 待机超标基础严重度 LOW; 大额年化成本升级为 MEDIUM
        let mut config = PlannerConfig::default();
        config.high_impact_cost_per_year = 1_000.0;
        let planner = RemediationPlanner::new(
            config,
            RemediationPlaybook::default(),
            Arc::new(DateSequenceGenerator::new()),
        );

        let plan = planner
            .plan(&anomaly(AnomalyType::StandbyPowerExcessive, 500.0), now())
            .unwrap();
        assert_eq!(plan.severity, Severity::Medium);
    }

    #[test]
    fn test_no_escalation_below_threshold() {
        let plan = planner()
            .plan(&anomaly(AnomalyType::StandbyPowerExcessive, 1.0), now())
            .unwrap();
        assert_eq!(plan.severity, Severity::Low);
    }

    #[test]
    fn test_deadline_from_severity_table() {
        // PAINT_OVEN_IDLE 基础 HIGH → 期限 = now + 2h
        let plan = planner()
            .plan(&anomaly(AnomalyType::PaintOvenIdle, 200.0), now())
            .unwrap();
        assert_eq!(plan.deadline, now() + ChronoDuration::hours(2));

        // 小额待机超标 LOW → 期限 = now + 72h
        let plan = planner()
            .plan(&anomaly(AnomalyType::StandbyPowerExcessive, 1.0), now())
            .unwrap();
        assert_eq!(plan.deadline, now() + ChronoDuration::hours(72));
    }

    #[test]
    fn test_unknown_anomaly_type_hard_fails() {
        // 空手册: 任何类型都无映射
        let planner = RemediationPlanner::new(
            PlannerConfig::default(),
            RemediationPlaybook::from_entries(HashMap::new()),
            Arc::new(DateSequenceGenerator::new()),
        );

        let err = planner
            .plan(&anomaly(AnomalyType::PaintOvenIdle, 200.0), now())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownAnomalyType(_)));
    }

    #[test]
    fn test_work_order_id_format_and_monotonic() {
        let p = planner();
        let a = anomaly(AnomalyType::PaintOvenIdle, 200.0);

        let plan1 = p.plan(&a, now()).unwrap();
        let plan2 = p.plan(&a, now()).unwrap();

        assert_eq!(plan1.work_order_id, "WO-20260302-1001");
        assert_eq!(plan2.work_order_id, "WO-20260302-1002");
        assert_ne!(plan1.work_order_id, plan2.work_order_id);
    }

    #[test]
    fn test_air_leak_waste_uses_conversion_factor() {
        // 60 m³ × 0.1 kWh/m³ = 6 kWh/h
        let plan = planner()
            .plan(&anomaly(AnomalyType::CompressedAirLeak, 200.0), now())
            .unwrap();
        assert!((plan.impact.waste_kwh_per_hour - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_standby_waste_excludes_allowed_fraction() {
        // 100 kWh × (1 - 0.15) = 85 kWh/h
        let plan = planner()
            .plan(&anomaly(AnomalyType::StandbyPowerExcessive, 100.0), now())
            .unwrap();
        assert!((plan.impact.waste_kwh_per_hour - 85.0).abs() < 1e-9);
    }
}
