// ==========================================
// 汽车工厂能效决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变式
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod anomaly;
pub mod forecast;
pub mod remediation;
pub mod telemetry;
pub mod types;

// 重导出核心类型
pub use anomaly::{
    AnomalyRecord, DetectionReport, FusionResult, FusionSummary, MetricSnapshot, SkippedReading,
};
pub use forecast::{ForecastPoint, ForecastReport, MAX_FORECAST_HORIZON};
pub use remediation::{FinancialImpact, NotificationPayload, PriorityEntry, RemediationPlan};
pub use telemetry::{
    HourlyEnergyPoint, ReadingFilter, WindowKpis, ZoneEnergyShare, ZoneReading,
};
pub use types::{
    AnomalySource, AnomalyType, Severity, ShiftCode, WorkOrderStatus, ZoneStatus,
};
