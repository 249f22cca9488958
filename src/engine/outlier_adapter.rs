// ==========================================
// 汽车工厂能效决策支持系统 - 离群评分适配器
// ==========================================
// 职责: 读数 → 特征向量 → 外部离群评分服务 → 异常记录
// 红线: 特征顺序与命名由模型契约固定 (重排/缺失会静默污染评分);
//       服务不可用上报 ScoringUnavailable,调用方视为"无模型贡献",
//       绝不解释为"无异常" (不得掩盖规则命中)
// ==========================================

use crate::domain::anomaly::{AnomalyRecord, DetectionReport, MetricSnapshot, SkippedReading};
use crate::domain::telemetry::ZoneReading;
use crate::domain::types::{AnomalySource, AnomalyType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::scoring::{AnomalyScoringService, ScoringRequest, ANOMALY_FEATURE_FIELDS};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ==========================================
// OutlierScorerAdapter - 离群评分适配器
// ==========================================
pub struct OutlierScorerAdapter {
    service: Arc<dyn AnomalyScoringService>,
    timeout: Duration,
}

impl OutlierScorerAdapter {
    /// 构造函数
    ///
    /// # 参数
    /// - service: 外部离群评分服务 (托管模型/本地统计模型/测试桩)
    /// - timeout: 服务调用超时上限
    pub fn new(service: Arc<dyn AnomalyScoringService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对读数窗口执行模型评分
    ///
    /// # 返回
    /// - Ok(DetectionReport): 模型命中记录 (source=MODEL, confidence=评分)
    ///   + 因特征不完整被跳过的读数统计
    /// - Err(ScoringUnavailable): 服务超时/出错/响应违反契约
    ///
    /// # 契约
    /// 提交行与响应行一一对应,行数不匹配即契约违反
    pub async fn score(&self, readings: &[ZoneReading]) -> EngineResult<DetectionReport> {
        // === 步骤 1: 特征构建 (保持读数顺序) ===
        let mut zone_codes: HashMap<String, f64> = HashMap::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut submitted: Vec<&ZoneReading> = Vec::new();
        let mut skipped: Vec<SkippedReading> = Vec::new();

        for reading in readings {
            if let Some(reason) = reading.quality_issue() {
                skipped.push(SkippedReading {
                    zone_id: reading.zone_id.clone(),
                    timestamp: reading.timestamp,
                    reason: reason.to_string(),
                });
                continue;
            }
            // 温度缺失时特征向量不完整,该读数不参与模型评分
            let temperature = match reading.temperature_c {
                Some(t) => t,
                None => {
                    skipped.push(SkippedReading {
                        zone_id: reading.zone_id.clone(),
                        timestamp: reading.timestamp,
                        reason: "temperature_c 缺失,特征不完整".to_string(),
                    });
                    continue;
                }
            };

            rows.push(self.build_feature_row(reading, temperature, &mut zone_codes));
            submitted.push(reading);
        }

        if submitted.is_empty() {
            let skipped_count = skipped.len();
            return Ok(DetectionReport {
                anomalies: Vec::new(),
                evaluated_count: 0,
                skipped_count,
                skipped,
            });
        }

        // === 步骤 2: 调用评分服务 (有界超时) ===
        let request = ScoringRequest::new(&ANOMALY_FEATURE_FIELDS, rows);
        let scores = match tokio::time::timeout(self.timeout, self.service.score(&request)).await {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "离群评分服务出错");
                return Err(EngineError::ScoringUnavailable(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "离群评分服务超时");
                return Err(EngineError::ScoringUnavailable(format!(
                    "调用超时 (>{} ms)",
                    self.timeout.as_millis()
                )));
            }
        };

        // === 步骤 3: 响应契约校验 ===
        if scores.len() != submitted.len() {
            return Err(EngineError::ScoringUnavailable(format!(
                "响应行数 {} 与提交行数 {} 不匹配",
                scores.len(),
                submitted.len()
            )));
        }
        for score in &scores {
            if let Some(violation) = score.contract_violation() {
                return Err(EngineError::ScoringUnavailable(violation));
            }
        }

        // === 步骤 4: 归一化为异常记录 ===
        let anomalies = submitted
            .iter()
            .zip(scores.iter())
            .filter(|(_, s)| s.label == 1)
            .map(|(reading, s)| AnomalyRecord {
                anomaly_id: Uuid::new_v4().to_string(),
                zone_id: reading.zone_id.clone(),
                timestamp: reading.timestamp,
                anomaly_type: AnomalyType::ModelDetected,
                source: AnomalySource::Model,
                confidence: s.score,
                snapshot: MetricSnapshot::from_reading(reading),
                note: format!("离群模型命中 (score={:.3})", s.score),
            })
            .collect();

        let evaluated_count = submitted.len();
        let skipped_count = skipped.len();
        Ok(DetectionReport {
            anomalies,
            evaluated_count,
            skipped_count,
            skipped,
        })
    }

    /// 构建单读数特征行 (顺序与 ANOMALY_FEATURE_FIELDS 严格一致)
    fn build_feature_row(
        &self,
        reading: &ZoneReading,
        temperature: f64,
        zone_codes: &mut HashMap<String, f64>,
    ) -> Vec<f64> {
        // 区域编码: 窗口内首次出现顺序的稳定索引
        let next_code = zone_codes.len() as f64;
        let zone_encoded = *zone_codes
            .entry(reading.zone_id.clone())
            .or_insert(next_code);

        vec![
            reading.energy_kwh,
            reading.production_units as f64,
            temperature,
            reading.compressed_air_m3,
            reading.shift.encoded(),
            zone_encoded,
            reading.energy_per_unit(),
            reading.air_per_unit(),
        ]
    }
}
