// ==========================================
// DetectorFusion 引擎集成测试
// ==========================================
// 测试目标: 计数守恒 / 融合语义 / 阈值门槛
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use plant_greenops::domain::anomaly::MetricSnapshot;
use plant_greenops::domain::types::{AnomalySource, AnomalyType};
use plant_greenops::domain::AnomalyRecord;
use plant_greenops::engine::{DetectorFusion, DEFAULT_SCORE_THRESHOLD};
use uuid::Uuid;

// ==========================================
// 测试辅助函数
// ==========================================

fn ts(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn create_record(
    zone: &str,
    hour: u32,
    anomaly_type: AnomalyType,
    source: AnomalySource,
    confidence: f64,
) -> AnomalyRecord {
    AnomalyRecord {
        anomaly_id: Uuid::new_v4().to_string(),
        zone_id: zone.to_string(),
        timestamp: ts(hour),
        anomaly_type,
        source,
        confidence,
        snapshot: MetricSnapshot {
            energy_kwh: 150.0,
            production_units: 0,
            temperature_c: Some(21.0),
            compressed_air_m3: 20.0,
        },
        note: "测试记录".to_string(),
    }
}

fn rule(zone: &str, hour: u32, t: AnomalyType) -> AnomalyRecord {
    create_record(zone, hour, t, AnomalySource::Rule, 1.0)
}

fn model(zone: &str, hour: u32, score: f64) -> AnomalyRecord {
    create_record(zone, hour, AnomalyType::ModelDetected, AnomalySource::Model, score)
}

#[test]
fn test_count_conservation_no_loss_no_double_count() {
    // 守恒律: agreed + rule_only + model_only = 门槛过滤后两路不同键总数
    let fusion = DetectorFusion::new();

    let rules = vec![
        rule("Z1", 8, AnomalyType::PaintOvenIdle),
        rule("Z2", 8, AnomalyType::CompressedAirLeak),
        rule("Z3", 10, AnomalyType::HvacOvercooling),
    ];
    let models = vec![
        model("Z1", 8, 0.9),  // 与规则同键
        model("Z2", 9, 0.8),  // 仅模型
        model("Z4", 8, 0.75), // 仅模型
    ];

    let result = fusion.fuse(rules, models, DEFAULT_SCORE_THRESHOLD);

    // 不同键: (Z1,8) (Z2,8) (Z3,10) (Z2,9) (Z4,8) = 5
    assert_eq!(result.summary.total(), 5);
    assert_eq!(result.records.len(), result.summary.total());
    assert_eq!(result.summary.agreed, 1);
    assert_eq!(result.summary.rule_only, 2);
    assert_eq!(result.summary.model_only, 2);

    // 每个键只出现一次
    let mut keys: Vec<(String, NaiveDateTime)> =
        result.records.iter().map(|r| r.fusion_key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 5);
}

#[test]
fn test_fused_record_takes_rule_type_and_max_confidence() {
    let fusion = DetectorFusion::new();
    let result = fusion.fuse(
        vec![rule("Z1", 8, AnomalyType::StandbyPowerExcessive)],
        vec![model("Z1", 8, 0.66)],
        0.5,
    );

    assert_eq!(result.records.len(), 1);
    let fused = &result.records[0];
    assert_eq!(fused.source, AnomalySource::Fused);
    assert_eq!(fused.anomaly_type, AnomalyType::StandbyPowerExcessive);
    assert_eq!(fused.confidence, 1.0);
    // 融合记录保留两侧信息的可解释说明
    assert!(fused.note.contains("0.660"));
}

#[test]
fn test_model_only_keeps_model_detected_type() {
    let fusion = DetectorFusion::new();
    let result = fusion.fuse(vec![], vec![model("Z9", 3, 0.95)], 0.5);

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].anomaly_type, AnomalyType::ModelDetected);
    assert_eq!(result.records[0].source, AnomalySource::Model);
    assert_eq!(result.records[0].confidence, 0.95);
}

#[test]
fn test_caller_threshold_overrides_default() {
    let fusion = DetectorFusion::new();

    // 评分 0.6 在门槛 0.7 下被拦截
    let strict = fusion.fuse(vec![], vec![model("Z1", 8, 0.6)], 0.7);
    assert!(strict.records.is_empty());
    assert_eq!(strict.summary.total(), 0);

    // 同一评分在门槛 0.5 下通过
    let lenient = fusion.fuse(vec![], vec![model("Z1", 8, 0.6)], 0.5);
    assert_eq!(lenient.records.len(), 1);
}

#[test]
fn test_empty_inputs() {
    let fusion = DetectorFusion::new();
    let result = fusion.fuse(vec![], vec![], DEFAULT_SCORE_THRESHOLD);
    assert!(result.records.is_empty());
    assert_eq!(result.summary.total(), 0);
}
