// ==========================================
// 汽车工厂能效决策支持系统 - 检测 API
// ==========================================
// 职责: 读数窗口 → 规则检测 + 模型评分 → 融合 → 整改工单
// 架构: API 层 → Engine 层 (RuleDetector/OutlierScorerAdapter/
//       DetectorFusion/RemediationPlanner) → Repository 层
// 红线: 评分服务不可用时检测退化为纯规则模式 (降级不失败);
//       未映射异常逐条失败并上报,不中断批次
// ==========================================

use crate::config::EngineConfigReader;
use crate::domain::anomaly::{AnomalyRecord, FusionResult, SkippedReading};
use crate::domain::remediation::RemediationPlan;
use crate::domain::telemetry::{ReadingFilter, WindowKpis};
use crate::engine::{
    AnomalyScoringService, DetectorFusion, EngineError, OutlierScorerAdapter, RemediationPlanner,
    RuleDetector, WorkOrderIdGenerator,
};
use crate::api::error::{ApiError, ApiResult};
use crate::repository::{TelemetryRepository, WorkOrderRepository};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// ==========================================
// 结果结构
// ==========================================

/// 检测运行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRunResult {
    pub fusion: FusionResult,
    pub model_available: bool,         // 评分服务是否参与本次检测
    pub evaluated_count: usize,        // 参与规则判定的读数
    pub skipped_count: usize,          // 数据质量跳过的读数
    pub skipped: Vec<SkippedReading>,  // 跳过明细 (部分结果必须标注)
}

/// 单条异常规划失败记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFailure {
    pub anomaly_id: String,
    pub anomaly_type: String,
    pub reason: String,
}

/// 批量规划结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanBatchResult {
    pub plans: Vec<RemediationPlan>,
    pub failures: Vec<PlanFailure>, // 逐异常失败,已记录日志并上报
}

/// 全链路运行报告 (检测 → 规划)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub kpis: WindowKpis,
    pub detection: DetectionRunResult,
    pub planning: PlanBatchResult,
}

// ==========================================
// DetectionApi - 检测 API
// ==========================================
pub struct DetectionApi {
    telemetry_repo: Arc<TelemetryRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    config: Arc<dyn EngineConfigReader>,
    scorer: Arc<dyn AnomalyScoringService>,
    id_generator: Arc<dyn WorkOrderIdGenerator>,
}

impl DetectionApi {
    /// 创建新的 DetectionApi 实例
    ///
    /// # 参数
    /// - telemetry_repo: 遥测仓储 (只读)
    /// - work_order_repo: 工单仓储
    /// - config: 引擎配置读取器
    /// - scorer: 离群评分服务
    /// - id_generator: 工单号生成器 (进程级共享,保证序号唯一)
    pub fn new(
        telemetry_repo: Arc<TelemetryRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        config: Arc<dyn EngineConfigReader>,
        scorer: Arc<dyn AnomalyScoringService>,
        id_generator: Arc<dyn WorkOrderIdGenerator>,
    ) -> Self {
        Self {
            telemetry_repo,
            work_order_repo,
            config,
            scorer,
            id_generator,
        }
    }

    // ==========================================
    // 检测
    // ==========================================

    /// 对读数窗口执行检测 (规则 + 模型 → 融合)
    ///
    /// # 降级口径
    /// 评分服务不可用时记录告警并退化为纯规则模式
    /// (model_available=false),绝不因服务故障丢失规则命中
    pub async fn run_detection(&self, filter: &ReadingFilter) -> ApiResult<DetectionRunResult> {
        let detection_config = self
            .config
            .get_detection_config()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;
        let score_threshold = self
            .config
            .get_fusion_score_threshold()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;

        let readings = self.telemetry_repo.find_readings(filter)?;
        tracing::info!(count = readings.len(), "检测窗口读数加载完成");

        // === 规则检测 ===
        let timeout = Duration::from_millis(detection_config.scoring_timeout_ms);
        let detector = RuleDetector::new(detection_config);
        let rule_report = detector.detect(&readings);

        // === 模型评分 (可降级) ===
        let adapter = OutlierScorerAdapter::new(self.scorer.clone(), timeout);
        let (model_records, model_available) = match adapter.score(&readings).await {
            Ok(report) => (report.anomalies, true),
            Err(EngineError::ScoringUnavailable(reason)) => {
                tracing::warn!(reason = %reason, "评分服务不可用,检测退化为纯规则模式");
                (Vec::new(), false)
            }
            Err(e) => return Err(e.into()),
        };

        // === 融合 ===
        let fusion = DetectorFusion::new().fuse(rule_report.anomalies, model_records, score_threshold);
        tracing::info!(
            agreed = fusion.summary.agreed,
            rule_only = fusion.summary.rule_only,
            model_only = fusion.summary.model_only,
            model_available,
            "检测融合完成"
        );

        Ok(DetectionRunResult {
            fusion,
            model_available,
            evaluated_count: rule_report.evaluated_count,
            skipped_count: rule_report.skipped_count,
            skipped: rule_report.skipped,
        })
    }

    // ==========================================
    // 整改规划
    // ==========================================

    /// 为异常记录批量生成整改工单并入库
    ///
    /// # 参数
    /// - records: 异常记录 (检测/融合输出,只读消费)
    /// - now_utc: 当前 UTC 时间 (工单创建时间与期限基准)
    ///
    /// # 错误口径
    /// - 未映射异常类型: 逐条失败,记入 failures,不中断批次
    /// - 工单号重复: 结构性缺陷,立即上报整批失败
    pub async fn plan_remediations(
        &self,
        records: &[AnomalyRecord],
        now_utc: NaiveDateTime,
    ) -> ApiResult<PlanBatchResult> {
        let planner_config = self
            .config
            .get_planner_config()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;
        let playbook = self
            .config
            .get_playbook()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;

        let planner =
            RemediationPlanner::new(planner_config, playbook, self.id_generator.clone());

        let mut plans = Vec::new();
        let mut failures = Vec::new();

        for record in records {
            match planner.plan(record, now_utc) {
                Ok(plan) => {
                    // 工单入库: 唯一约束冲突 = 序号生成器缺陷,立即上报
                    match self.work_order_repo.insert(&plan) {
                        Ok(()) => plans.push(plan),
                        Err(e) => {
                            let api_err: ApiError = e.into();
                            if let ApiError::DuplicateWorkOrder(_) = api_err {
                                tracing::error!(
                                    work_order_id = %plan.work_order_id,
                                    "工单号重复,序号生成器存在缺陷"
                                );
                            }
                            return Err(api_err);
                        }
                    }
                }
                Err(EngineError::UnknownAnomalyType(t)) => {
                    // 映射缺口逐条上报,不得静默丢弃
                    failures.push(PlanFailure {
                        anomaly_id: record.anomaly_id.clone(),
                        anomaly_type: t.clone(),
                        reason: format!("整改手册缺失条目: {}", t),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(PlanBatchResult { plans, failures })
    }

    // ==========================================
    // 全链路
    // ==========================================

    /// 运行完整检测链路: KPI → 检测融合 → 整改规划
    pub async fn run_pipeline(
        &self,
        filter: &ReadingFilter,
        now_utc: NaiveDateTime,
    ) -> ApiResult<PipelineReport> {
        let readings = self.telemetry_repo.find_readings(filter)?;
        if readings.is_empty() {
            return Err(ApiError::NotFound("指定条件下无遥测数据".to_string()));
        }
        let kpis = WindowKpis::from_readings(&readings);

        let detection = self.run_detection(filter).await?;
        let planning = self
            .plan_remediations(&detection.fusion.records, now_utc)
            .await?;

        Ok(PipelineReport {
            kpis,
            detection,
            planning,
        })
    }
}
