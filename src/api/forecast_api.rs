// ==========================================
// 汽车工厂能效决策支持系统 - 预测 API
// ==========================================
// 职责: 历史聚合 → 递推预测
// 架构: API 层 → TelemetryRepository (聚合查询) → ForecastEngine
// 红线: 时域越界在任何服务调用前拒绝; 历史缺口拒绝不插值
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfigReader;
use crate::domain::forecast::ForecastReport;
use crate::engine::{ForecastEngine, ForecastScoringService};
use crate::repository::TelemetryRepository;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

// ==========================================
// ForecastApi - 预测 API
// ==========================================
pub struct ForecastApi {
    telemetry_repo: Arc<TelemetryRepository>,
    config: Arc<dyn EngineConfigReader>,
    forecaster: Arc<dyn ForecastScoringService>,
}

impl ForecastApi {
    /// 创建新的 ForecastApi 实例
    ///
    /// # 参数
    /// - telemetry_repo: 遥测仓储 (小时聚合查询)
    /// - config: 引擎配置读取器 (服务超时)
    /// - forecaster: 外部预测回归服务
    pub fn new(
        telemetry_repo: Arc<TelemetryRepository>,
        config: Arc<dyn EngineConfigReader>,
        forecaster: Arc<dyn ForecastScoringService>,
    ) -> Self {
        Self {
            telemetry_repo,
            config,
            forecaster,
        }
    }

    /// 预测未来 horizon 小时电耗
    ///
    /// # 参数
    /// - zone_id: 可选区域口径 (None 为全厂)
    /// - from/to: 可选历史窗口 (含)
    /// - horizon: 预测时域 (1..=168)
    ///
    /// # 错误口径
    /// - 时域越界 → InvalidInput (任何服务调用前)
    /// - 历史缺口/为空 → ValidationError (拒绝,不插值)
    /// - 服务故障 → ForecastUnavailable (整个请求终止,无部分结果)
    pub async fn forecast_energy(
        &self,
        zone_id: Option<&str>,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
        horizon: u32,
    ) -> ApiResult<ForecastReport> {
        let detection_config = self
            .config
            .get_detection_config()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;

        let series = self
            .telemetry_repo
            .load_hourly_energy_series(zone_id, from, to)?;
        tracing::info!(
            zone = zone_id.unwrap_or("PLANT"),
            history_hours = series.len(),
            horizon,
            "开始递推预测"
        );

        let engine = ForecastEngine::new(
            self.forecaster.clone(),
            Duration::from_millis(detection_config.scoring_timeout_ms),
        );
        let report = engine.forecast(&series, horizon).await?;

        tracing::info!(
            points = report.points.len(),
            degraded = report.degraded,
            total_kwh = report.total_predicted_kwh,
            "递推预测完成"
        );
        Ok(report)
    }
}
