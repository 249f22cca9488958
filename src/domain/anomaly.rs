// ==========================================
// 汽车工厂能效决策支持系统 - 异常领域模型
// ==========================================
// 职责: 异常记录 / 检测报告 / 融合汇总
// 红线: 异常记录创建后不可变更,融合与整改只读消费
// ==========================================

use crate::domain::telemetry::ZoneReading;
use crate::domain::types::{AnomalySource, AnomalyType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// MetricSnapshot - 命中时刻指标快照
// ==========================================
// 用途: 留存被标记瞬间的原始指标,供整改估算与审计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub energy_kwh: f64,
    pub production_units: i64,
    pub temperature_c: Option<f64>,
    pub compressed_air_m3: f64,
}

impl MetricSnapshot {
    /// 从读数截取快照
    pub fn from_reading(reading: &ZoneReading) -> Self {
        Self {
            energy_kwh: reading.energy_kwh,
            production_units: reading.production_units,
            temperature_c: reading.temperature_c,
            compressed_air_m3: reading.compressed_air_m3,
        }
    }
}

// ==========================================
// AnomalyRecord - 异常记录
// ==========================================
// 不变式:
// - source=RULE 时 confidence 恒为 1.0
// - source=MODEL 时 confidence = 模型评分
// - source=FUSED 时 confidence = max(规则置信度, 模型评分)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub anomaly_id: String,         // 记录ID (uuid)
    pub zone_id: String,            // 区域
    pub timestamp: NaiveDateTime,   // 命中读数的时间戳
    pub anomaly_type: AnomalyType,  // 异常类型
    pub source: AnomalySource,      // 检出来源
    pub confidence: f64,            // 置信度 [0,1]
    pub snapshot: MetricSnapshot,   // 命中时刻指标快照
    pub note: String,               // 可解释原因 (所有引擎输出必须带 reason)
}

impl AnomalyRecord {
    /// 融合匹配键 (zone, timestamp)
    pub fn fusion_key(&self) -> (String, NaiveDateTime) {
        (self.zone_id.clone(), self.timestamp)
    }
}

// ==========================================
// SkippedReading - 被跳过的读数记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedReading {
    pub zone_id: String,
    pub timestamp: NaiveDateTime,
    pub reason: String,
}

// ==========================================
// DetectionReport - 检测报告
// ==========================================
// 红线: 部分结果必须标注跳过数量与原因,不得当作完整结果返回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub anomalies: Vec<AnomalyRecord>,
    pub evaluated_count: usize,        // 实际参与判定的读数
    pub skipped_count: usize,          // 因数据质量被跳过的读数
    pub skipped: Vec<SkippedReading>,  // 跳过明细
}

// ==========================================
// FusionSummary - 检出器对比汇总
// ==========================================
// 不变式: agreed + rule_only + model_only
//         == 两路输入中不同 (zone, timestamp) 键的总数
// 用途: 检出器表现对比报表,仅返回不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionSummary {
    pub agreed: usize,     // 规则与模型一致
    pub rule_only: usize,  // 仅规则命中
    pub model_only: usize, // 仅模型命中 (高于评分阈值)
}

impl FusionSummary {
    /// 检出键总数
    pub fn total(&self) -> usize {
        self.agreed + self.rule_only + self.model_only
    }
}

// ==========================================
// FusionResult - 融合输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionResult {
    pub records: Vec<AnomalyRecord>,
    pub summary: FusionSummary,
}
