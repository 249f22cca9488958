// ==========================================
// 汽车工厂能效决策支持系统 - 引擎层
// ==========================================
// 职责: 检测/融合/预测/整改/排序的业务规则引擎
// 红线: 引擎不拼 SQL; 所有判定输出必须带可解释 reason;
//       除工单序号外引擎全部无状态,按区域/窗口并行调用安全
// ==========================================

pub mod error;
pub mod forecast;
pub mod fusion;
pub mod notification;
pub mod outlier_adapter;
pub mod ranker;
pub mod remediation;
pub mod rule_detector;
pub mod scoring;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use forecast::ForecastEngine;
pub use fusion::{DetectorFusion, DEFAULT_SCORE_THRESHOLD};
pub use notification::NotificationFormatter;
pub use outlier_adapter::OutlierScorerAdapter;
pub use ranker::PriorityRanker;
pub use remediation::{DateSequenceGenerator, RemediationPlanner, WorkOrderIdGenerator};
pub use rule_detector::RuleDetector;
pub use scoring::{
    AnomalyScoringService, ForecastScoringService, LagMeanForecastService, ModelScore,
    OfflineScoringService, ScoringRequest, ANOMALY_FEATURE_FIELDS, FORECAST_FEATURE_FIELDS,
};
