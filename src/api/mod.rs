// ==========================================
// 汽车工厂能效决策支持系统 - API 层
// ==========================================
// 职责: 业务接口 (检测/预测/工单)
// 红线: API 层做编排与降级决策,算法在 Engine 层
// ==========================================

pub mod detection_api;
pub mod error;
pub mod forecast_api;
pub mod workorder_api;

pub use detection_api::{
    DetectionApi, DetectionRunResult, PipelineReport, PlanBatchResult, PlanFailure,
};
pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
pub use workorder_api::WorkOrderApi;
