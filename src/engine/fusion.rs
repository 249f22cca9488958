// ==========================================
// 汽车工厂能效决策支持系统 - 检出融合引擎
// ==========================================
// 职责: 按 (zone, timestamp) 合并规则检出与模型检出
// 输入: 同一读数窗口的 RULE 记录 + MODEL 记录 + 评分阈值
// 输出: FusionResult (融合记录 + agreed/rule_only/model_only 汇总)
// 红线: 无状态引擎,纯函数; 汇总仅返回不落库;
//       计数守恒: agreed + rule_only + model_only = 阈值过滤后
//       两路输入的不同 (zone, timestamp) 键总数
// ==========================================

use crate::domain::anomaly::{AnomalyRecord, FusionResult, FusionSummary};
use crate::domain::types::AnomalySource;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// 默认模型评分阈值
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

// ==========================================
// DetectorFusion - 检出融合引擎
// ==========================================
pub struct DetectorFusion {
    // 无状态引擎,不需要注入依赖
}

impl DetectorFusion {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 融合规则检出与模型检出
    ///
    /// # 参数
    /// - rule_records: 规则检出 (source=RULE)
    /// - model_records: 模型检出 (source=MODEL)
    /// - score_threshold: 模型评分门槛 (低于门槛的模型检出不参与融合)
    ///
    /// # 规则
    /// - 两路同键 → 一条 FUSED 记录,类型取规则侧,置信度取两侧较大值
    /// - 仅规则命中 → 原样透传 (source=RULE)
    /// - 仅模型命中且过门槛 → 原样透传 (source=MODEL, 类型 MODEL_DETECTED)
    /// - 同键出现多条规则命中 (正常不应发生,防御性处理):
    ///   按规则优先级取序号更小者
    pub fn fuse(
        &self,
        rule_records: Vec<AnomalyRecord>,
        model_records: Vec<AnomalyRecord>,
        score_threshold: f64,
    ) -> FusionResult {
        // === 步骤 1: 模型侧评分门槛过滤 ===
        let gated_models: Vec<AnomalyRecord> = model_records
            .into_iter()
            .filter(|m| m.confidence >= score_threshold)
            .collect();

        // === 步骤 2: 规则侧按键去重 (防御性, 优先级序号小者胜出) ===
        let mut rule_by_key: HashMap<(String, NaiveDateTime), AnomalyRecord> = HashMap::new();
        let mut rule_key_order: Vec<(String, NaiveDateTime)> = Vec::new();
        for record in rule_records {
            let key = record.fusion_key();
            match rule_by_key.get(&key).map(|e| e.anomaly_type) {
                None => {
                    rule_key_order.push(key.clone());
                    rule_by_key.insert(key, record);
                }
                Some(existing_type) => {
                    if record.anomaly_type.rule_priority() < existing_type.rule_priority() {
                        tracing::warn!(
                            zone = %record.zone_id,
                            timestamp = %record.timestamp,
                            kept = %record.anomaly_type,
                            dropped = %existing_type,
                            "同键出现多条规则命中,按优先级保留"
                        );
                        rule_by_key.insert(key, record);
                    }
                }
            }
        }

        // === 步骤 3: 模型侧按键索引 (同键取评分较高者) ===
        let mut model_by_key: HashMap<(String, NaiveDateTime), AnomalyRecord> = HashMap::new();
        let mut model_key_order: Vec<(String, NaiveDateTime)> = Vec::new();
        for record in gated_models {
            let key = record.fusion_key();
            match model_by_key.get(&key).map(|e| e.confidence) {
                None => {
                    model_key_order.push(key.clone());
                    model_by_key.insert(key, record);
                }
                Some(existing_confidence) => {
                    if record.confidence > existing_confidence {
                        model_by_key.insert(key, record);
                    }
                }
            }
        }

        // === 步骤 4: 按键匹配 ===
        let mut records = Vec::new();
        let mut agreed = 0usize;
        let mut rule_only = 0usize;
        let mut model_only = 0usize;

        for key in &rule_key_order {
            let Some(rule) = rule_by_key.remove(key) else {
                continue;
            };
            match model_by_key.remove(key) {
                Some(model) => {
                    agreed += 1;
                    let confidence = rule.confidence.max(model.confidence);
                    let note = format!(
                        "规则与模型一致: {} | 模型评分 {:.3}",
                        rule.note, model.confidence
                    );
                    records.push(AnomalyRecord {
                        source: AnomalySource::Fused,
                        confidence,
                        note,
                        ..rule
                    });
                }
                None => {
                    rule_only += 1;
                    records.push(rule);
                }
            }
        }

        // 剩余模型检出 (无对应规则命中) 原样透传
        for key in &model_key_order {
            if let Some(model) = model_by_key.remove(key) {
                model_only += 1;
                records.push(model);
            }
        }

        FusionResult {
            records,
            summary: FusionSummary {
                agreed,
                rule_only,
                model_only,
            },
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for DetectorFusion {
    fn default() -> Self {
        Self::new()
    }
}
