// ==========================================
// 汽车工厂能效决策支持系统 - 电耗预测引擎
// ==========================================
// 职责: 基于小时级历史聚合序列递推预测未来 H 小时电耗
// 输入: 无缺口的小时电耗序列 + 时域 H (1..=168)
// 输出: ForecastReport (H 个预测点, 偏移严格递增)
// 红线: 递推反馈是刻意的串行状态 (每步输出回填为下一步
//       滞后输入),绝不可按时域并行化; 任一步失败终止整个
//       请求,部分递推结果具有误导性,不得返回
// 口径: 误差随 hour_offset 递推累积,期望意义下精度单调劣化
// ==========================================

use crate::domain::forecast::{ForecastPoint, ForecastReport, MAX_FORECAST_HORIZON};
use crate::domain::telemetry::HourlyEnergyPoint;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::scoring::{ForecastScoringService, ScoringRequest, FORECAST_FEATURE_FIELDS};
use chrono::{Datelike, Duration as ChronoDuration, Timelike};
use std::sync::Arc;
use std::time::Duration;

/// 滞后特征偏移 (小时)
const LAG_OFFSETS: [usize; 5] = [1, 3, 6, 12, 24];

/// 滚动统计窗口 (小时)
const ROLLING_WINDOW: usize = 24;

// ==========================================
// ForecastEngine - 电耗预测引擎
// ==========================================
pub struct ForecastEngine {
    service: Arc<dyn ForecastScoringService>,
    timeout: Duration,
}

impl ForecastEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - service: 外部预测回归服务 (单行特征向量进,标量出)
    /// - timeout: 单步服务调用超时上限
    pub fn new(service: Arc<dyn ForecastScoringService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 递推预测未来 horizon 小时电耗
    ///
    /// # 参数
    /// - history: 小时电耗历史 (时间升序、整点连续; 缺口由上游
    ///   补齐或在此拒绝,引擎不做插值)
    /// - horizon: 预测时域 (1..=168, 越界在任何服务调用前拒绝)
    ///
    /// # 返回
    /// - Ok(ForecastReport): H 个预测点, hour_offset 严格递增 1..=H
    /// - Err(InvalidHorizon / EmptySeries / NonContiguousSeries /
    ///   ForecastServiceUnavailable)
    ///
    /// # 降级口径
    /// 真实历史不足 24 小时时,滚动统计按可用窗口均值补齐到 24,
    /// 报告标记 degraded=true (精度降级模式,不是失败)
    pub async fn forecast(
        &self,
        history: &[HourlyEnergyPoint],
        horizon: u32,
    ) -> EngineResult<ForecastReport> {
        // === 步骤 1: 入参校验 (先于任何服务调用) ===
        if horizon == 0 || horizon > MAX_FORECAST_HORIZON {
            return Err(EngineError::InvalidHorizon(horizon));
        }
        if history.is_empty() {
            return Err(EngineError::EmptySeries);
        }
        for point in history {
            if !point.energy_kwh.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "历史点 {} 电耗非法",
                    point.timestamp
                )));
            }
        }
        for pair in history.windows(2) {
            if pair[1].timestamp - pair[0].timestamp != ChronoDuration::hours(1) {
                return Err(EngineError::NonContiguousSeries(pair[0].timestamp));
            }
        }

        let degraded = history.len() < ROLLING_WINDOW;
        if degraded {
            tracing::warn!(
                history_hours = history.len(),
                "历史不足 24 小时,滚动特征按可用窗口均值补齐 (精度降级)"
            );
        }

        // === 步骤 2: 逐小时递推 ===
        // 滞后缓冲: 真实历史 + 已产生的预测值
        let mut buffer: Vec<f64> = history.iter().map(|p| p.energy_kwh).collect();
        let last_ts = history[history.len() - 1].timestamp;
        let mut points = Vec::with_capacity(horizon as usize);

        for hour in 1..=horizon {
            let future_ts = last_ts + ChronoDuration::hours(hour as i64);

            let row = Self::build_feature_row(&buffer, future_ts);
            let request = ScoringRequest::new(&FORECAST_FEATURE_FIELDS, vec![row]);

            let predicted =
                match tokio::time::timeout(self.timeout, self.service.predict(&request)).await {
                    Ok(Ok(v)) => v,
                    Ok(Err(e)) => {
                        return Err(EngineError::ForecastServiceUnavailable {
                            hour,
                            reason: e.to_string(),
                        })
                    }
                    Err(_) => {
                        return Err(EngineError::ForecastServiceUnavailable {
                            hour,
                            reason: format!("调用超时 (>{} ms)", self.timeout.as_millis()),
                        })
                    }
                };

            if !predicted.is_finite() {
                return Err(EngineError::ForecastServiceUnavailable {
                    hour,
                    reason: format!("服务返回非法标量: {}", predicted),
                });
            }

            // 递推反馈: 本步输出进入缓冲,作为下一步的滞后输入
            buffer.push(predicted);
            points.push(ForecastPoint {
                hour_offset: hour,
                predicted_energy_kwh: predicted,
                timestamp: future_ts,
            });
        }

        Ok(ForecastReport::new(points, history.len(), degraded))
    }

    // ==========================================
    // 特征构建
    // ==========================================

    /// 构建单步特征行 (顺序与 FORECAST_FEATURE_FIELDS 严格一致)
    ///
    /// - 滞后项: 偏移超出缓冲范围时取最早可用值
    /// - 滚动统计: 尾部 24 条; 不足 24 条按窗口均值补齐
    ///   (均值不变,离差按补齐后的窗口长度归一)
    fn build_feature_row(buffer: &[f64], future_ts: chrono::NaiveDateTime) -> Vec<f64> {
        let mut row = Vec::with_capacity(FORECAST_FEATURE_FIELDS.len());

        for offset in LAG_OFFSETS {
            let value = if buffer.len() >= offset {
                buffer[buffer.len() - offset]
            } else {
                buffer[0]
            };
            row.push(value);
        }

        let window_start = buffer.len().saturating_sub(ROLLING_WINDOW);
        let window = &buffer[window_start..];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        // 不足 24 条时均值补齐: 补齐值离差为 0, 只需按 24 归一
        let sq_dev: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std = (sq_dev / ROLLING_WINDOW as f64).sqrt();
        row.push(mean);
        row.push(std);

        let dow = future_ts.weekday().num_days_from_monday();
        row.push(future_ts.hour() as f64);
        row.push(dow as f64);
        row.push(if dow >= 5 { 1.0 } else { 0.0 });

        row
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::LagMeanForecastService;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn series(start_hour: u32, values: &[f64]) -> Vec<HourlyEnergyPoint> {
        let base = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(start_hour, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| HourlyEnergyPoint {
                timestamp: base + ChronoDuration::hours(i as i64),
                energy_kwh: v,
            })
            .collect()
    }

    /// 统计调用次数并按 lag_1h + 1 返回的测试桩 (验证递推反馈)
    struct IncrementService {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ForecastScoringService for IncrementService {
        async fn predict(&self, request: &ScoringRequest) -> anyhow::Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request.rows[0][0] + 1.0)
        }
    }

    /// 第 N 次调用失败的测试桩
    struct FailAtService {
        calls: AtomicU32,
        fail_at: u32,
    }

    #[async_trait]
    impl ForecastScoringService for FailAtService {
        async fn predict(&self, _request: &ScoringRequest) -> anyhow::Result<f64> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.fail_at {
                anyhow::bail!("第 {} 次调用失败", n)
            }
            Ok(100.0)
        }
    }

    fn engine(service: Arc<dyn ForecastScoringService>) -> ForecastEngine {
        ForecastEngine::new(service, Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_invalid_horizon_rejected_before_service_call() {
        let service = Arc::new(IncrementService {
            calls: AtomicU32::new(0),
        });
        let e = engine(service.clone());
        let history = series(0, &[100.0; 30]);

        for h in [0u32, 169, 200] {
            let err = e.forecast(&history, h).await.unwrap_err();
            assert!(matches!(err, EngineError::InvalidHorizon(x) if x == h));
        }
        // 越界请求未触发任何服务调用
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forecast_shape_h24() {
        let e = engine(Arc::new(IncrementService {
            calls: AtomicU32::new(0),
        }));
        let history = series(0, &[100.0; 48]);
        let report = e.forecast(&history, 24).await.unwrap();

        assert_eq!(report.points.len(), 24);
        for (i, point) in report.points.iter().enumerate() {
            assert_eq!(point.hour_offset, i as u32 + 1);
        }
        for pair in report.points.windows(2) {
            assert_eq!(
                pair[1].timestamp - pair[0].timestamp,
                ChronoDuration::hours(1)
            );
        }
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn test_stationary_series_stays_constant() {
        // 平稳序列 + 滞后均值后端 → 全时域保持常值 (递推不引入漂移)
        let e = engine(Arc::new(LagMeanForecastService));
        let history = series(0, &[420.0; 36]);
        let report = e.forecast(&history, 24).await.unwrap();

        for point in &report.points {
            assert!(
                (point.predicted_energy_kwh - 420.0).abs() < 1e-9,
                "偏移 {} 处漂移: {}",
                point.hour_offset,
                point.predicted_energy_kwh
            );
        }
    }

    #[tokio::test]
    async fn test_recursive_feedback_feeds_next_step() {
        // lag_1h + 1 后端: 第 i 步预测 = 末值 + i, 证明输出回填为滞后输入
        let e = engine(Arc::new(IncrementService {
            calls: AtomicU32::new(0),
        }));
        let history = series(0, &[100.0; 30]);
        let report = e.forecast(&history, 5).await.unwrap();

        let expected = [101.0, 102.0, 103.0, 104.0, 105.0];
        for (point, want) in report.points.iter().zip(expected) {
            assert_eq!(point.predicted_energy_kwh, want);
        }
    }

    #[tokio::test]
    async fn test_gap_in_history_rejected() {
        let mut history = series(0, &[100.0; 10]);
        // 在第 5 与第 6 点之间挖一个缺口
        for point in history.iter_mut().skip(6) {
            point.timestamp += ChronoDuration::hours(1);
        }

        let e = engine(Arc::new(LagMeanForecastService));
        let err = e.forecast(&history, 6).await.unwrap_err();
        assert!(matches!(err, EngineError::NonContiguousSeries(_)));
    }

    #[tokio::test]
    async fn test_empty_history_rejected() {
        let e = engine(Arc::new(LagMeanForecastService));
        let err = e.forecast(&[], 6).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptySeries));
    }

    #[tokio::test]
    async fn test_short_history_marks_degraded() {
        let e = engine(Arc::new(LagMeanForecastService));
        let history = series(0, &[300.0; 6]); // 不足 24 小时
        let report = e.forecast(&history, 4).await.unwrap();

        assert!(report.degraded);
        assert_eq!(report.history_hours, 6);
        // 平稳短历史依旧保持常值 (补齐均值不引入漂移)
        for point in &report.points {
            assert!((point.predicted_energy_kwh - 300.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_step_failure_aborts_whole_request() {
        let e = engine(Arc::new(FailAtService {
            calls: AtomicU32::new(0),
            fail_at: 3,
        }));
        let history = series(0, &[100.0; 30]);
        let err = e.forecast(&history, 10).await.unwrap_err();

        match err {
            EngineError::ForecastServiceUnavailable { hour, .. } => assert_eq!(hour, 3),
            other => panic!("期望 ForecastServiceUnavailable, 实际 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_calendar_features_in_request() {
        // 2026-03-02 为周一; 从 22:00 起第 3 步落在周二 01:00
        struct CaptureService {
            rows: std::sync::Mutex<Vec<Vec<f64>>>,
        }

        #[async_trait]
        impl ForecastScoringService for CaptureService {
            async fn predict(&self, request: &ScoringRequest) -> anyhow::Result<f64> {
                self.rows.lock().unwrap().push(request.rows[0].clone());
                Ok(100.0)
            }
        }

        let service = Arc::new(CaptureService {
            rows: std::sync::Mutex::new(Vec::new()),
        });
        let e = engine(service.clone());
        let base = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let history: Vec<HourlyEnergyPoint> = (0..24)
            .map(|i| HourlyEnergyPoint {
                timestamp: base - ChronoDuration::hours(23 - i),
                energy_kwh: 100.0,
            })
            .collect();

        e.forecast(&history, 3).await.unwrap();
        let rows = service.rows.lock().unwrap();
        // 第 1 步: 23:00 周一 → hour=23, dow=0, weekend=0
        assert_eq!(rows[0][7], 23.0);
        assert_eq!(rows[0][8], 0.0);
        assert_eq!(rows[0][9], 0.0);
        // 第 3 步: 周二 01:00 → hour=1, dow=1
        assert_eq!(rows[2][7], 1.0);
        assert_eq!(rows[2][8], 1.0);
    }
}
