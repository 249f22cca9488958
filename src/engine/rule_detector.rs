// ==========================================
// 汽车工厂能效决策支持系统 - 规则检测引擎
// ==========================================
// 职责: 对区域小时读数逐条执行阈值规则判定
// 输入: 时间升序的读数序列 + 检测配置
// 输出: DetectionReport (异常记录 + 跳过统计)
// 红线: 纯函数引擎,无副作用; 规则按固定优先级求值,
//       首条命中决定异常类型,同一读数不产生多条规则异常
// ==========================================

use crate::config::DetectionConfig;
use crate::domain::anomaly::{AnomalyRecord, DetectionReport, MetricSnapshot, SkippedReading};
use crate::domain::telemetry::ZoneReading;
use crate::domain::types::{AnomalySource, AnomalyType, ZoneStatus};
use std::collections::HashMap;
use std::collections::VecDeque;
use uuid::Uuid;

/// 单位能耗劣化判定所需的最少基线样本数
const MIN_BASELINE_SAMPLES: usize = 3;

// ==========================================
// RuleDetector - 规则检测引擎
// ==========================================
pub struct RuleDetector {
    config: DetectionConfig,
}

impl RuleDetector {
    /// 构造函数
    ///
    /// # 参数
    /// - config: 检测配置快照 (阈值全部来自配置,引擎内零常量)
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行规则检测
    ///
    /// # 参数
    /// - readings: 读数序列 (要求时间非降序,单位能耗基线依赖该顺序)
    ///
    /// # 返回
    /// DetectionReport: 异常记录 (source=RULE, confidence=1.0) + 跳过统计
    ///
    /// # 错误口径
    /// 畸形读数跳过并计数,绝不中断批次
    pub fn detect(&self, readings: &[ZoneReading]) -> DetectionReport {
        let mut anomalies = Vec::new();
        let mut skipped = Vec::new();
        let mut evaluated_count = 0usize;

        // 分区域滚动基线: zone_id → 最近 N 条单位能耗
        let mut ratio_windows: HashMap<String, VecDeque<f64>> = HashMap::new();

        for reading in readings {
            if let Some(reason) = reading.quality_issue() {
                tracing::debug!(
                    zone = %reading.zone_id,
                    timestamp = %reading.timestamp,
                    reason,
                    "读数质量不合格,跳过"
                );
                skipped.push(SkippedReading {
                    zone_id: reading.zone_id.clone(),
                    timestamp: reading.timestamp,
                    reason: reason.to_string(),
                });
                continue;
            }
            evaluated_count += 1;

            let window = ratio_windows
                .entry(reading.zone_id.clone())
                .or_insert_with(VecDeque::new);

            if let Some((anomaly_type, note)) = self.first_match(reading, window) {
                anomalies.push(AnomalyRecord {
                    anomaly_id: Uuid::new_v4().to_string(),
                    zone_id: reading.zone_id.clone(),
                    timestamp: reading.timestamp,
                    anomaly_type,
                    source: AnomalySource::Rule,
                    confidence: 1.0, // 规则命中为确定性判定
                    snapshot: MetricSnapshot::from_reading(reading),
                    note,
                });
            }

            // 基线更新放在判定之后,当前读数不参与自身的基线
            window.push_back(reading.energy_per_unit());
            if window.len() > self.config.efficiency_window {
                window.pop_front();
            }
        }

        let skipped_count = skipped.len();
        DetectionReport {
            anomalies,
            evaluated_count,
            skipped_count,
            skipped,
        }
    }

    // ==========================================
    // 规则链 (固定优先级, 首条命中即返回)
    // ==========================================

    fn first_match(
        &self,
        reading: &ZoneReading,
        ratio_window: &VecDeque<f64>,
    ) -> Option<(AnomalyType, String)> {
        self.check_paint_oven_idle(reading)
            .or_else(|| self.check_compressed_air_leak(reading))
            .or_else(|| self.check_hvac_overcooling(reading))
            .or_else(|| self.check_hvac_inefficiency(reading))
            .or_else(|| self.check_standby_power(reading))
            .or_else(|| self.check_efficiency_drop(reading, ratio_window))
    }

    /// 规则 1: 喷漆烘炉空转
    /// 喷漆类区域 + 零产量 + 电耗高于空转阈值
    fn check_paint_oven_idle(&self, reading: &ZoneReading) -> Option<(AnomalyType, String)> {
        let is_paint_zone = reading
            .zone_id
            .to_uppercase()
            .contains(&self.config.paint_zone_marker.to_uppercase());
        if is_paint_zone
            && reading.production_units == 0
            && reading.energy_kwh > self.config.paint_idle_energy_kwh
        {
            return Some((
                AnomalyType::PaintOvenIdle,
                format!(
                    "零产量时段电耗 {:.1} kWh 超过空转阈值 {:.1} kWh",
                    reading.energy_kwh, self.config.paint_idle_energy_kwh
                ),
            ));
        }
        None
    }

    /// 规则 2: 压缩空气泄漏
    /// 气耗高于泄漏阈值 + 产量不超过 1
    fn check_compressed_air_leak(&self, reading: &ZoneReading) -> Option<(AnomalyType, String)> {
        if reading.compressed_air_m3 > self.config.air_leak_m3 && reading.production_units <= 1 {
            return Some((
                AnomalyType::CompressedAirLeak,
                format!(
                    "低产量时段气耗 {:.1} m³ 超过泄漏阈值 {:.1} m³ (产量 {})",
                    reading.compressed_air_m3, self.config.air_leak_m3, reading.production_units
                ),
            ));
        }
        None
    }

    /// 规则 3a: 空调过度制冷
    /// 温度低于低温阈值 (温度缺失时规则不适用,不计为畸形)
    fn check_hvac_overcooling(&self, reading: &ZoneReading) -> Option<(AnomalyType, String)> {
        let temp = reading.temperature_c?;
        if temp < self.config.hvac_low_temp_c {
            return Some((
                AnomalyType::HvacOvercooling,
                format!(
                    "温度 {:.1}°C 低于下限 {:.1}°C",
                    temp, self.config.hvac_low_temp_c
                ),
            ));
        }
        None
    }

    /// 规则 3b: 空调能效异常
    /// 单位面积电耗超过上限 (区域未配置面积时规则不适用)
    fn check_hvac_inefficiency(&self, reading: &ZoneReading) -> Option<(AnomalyType, String)> {
        let area = *self.config.zone_area_m2.get(&reading.zone_id)?;
        if area <= 0.0 {
            return None;
        }
        let kwh_per_m2 = reading.energy_kwh / area;
        if kwh_per_m2 > self.config.hvac_kwh_per_m2_limit {
            return Some((
                AnomalyType::HvacInefficiency,
                format!(
                    "单位面积电耗 {:.3} kWh/m² 超过上限 {:.3} kWh/m²",
                    kwh_per_m2, self.config.hvac_kwh_per_m2_limit
                ),
            ));
        }
        None
    }

    /// 规则 4: 待机功耗超标
    /// 待机状态 + 电耗高于待机阈值
    fn check_standby_power(&self, reading: &ZoneReading) -> Option<(AnomalyType, String)> {
        if reading.status == ZoneStatus::Standby
            && reading.energy_kwh > self.config.standby_energy_kwh
        {
            return Some((
                AnomalyType::StandbyPowerExcessive,
                format!(
                    "待机电耗 {:.1} kWh 超过待机阈值 {:.1} kWh",
                    reading.energy_kwh, self.config.standby_energy_kwh
                ),
            ));
        }
        None
    }

    /// 规则 5: 单位能耗劣化
    /// 单位能耗超过滚动基线均值的配置倍数 (基线样本不足时规则不适用)
    fn check_efficiency_drop(
        &self,
        reading: &ZoneReading,
        ratio_window: &VecDeque<f64>,
    ) -> Option<(AnomalyType, String)> {
        if ratio_window.len() < MIN_BASELINE_SAMPLES {
            return None;
        }
        let baseline = ratio_window.iter().sum::<f64>() / ratio_window.len() as f64;
        if baseline <= 0.0 {
            return None;
        }
        let ratio = reading.energy_per_unit();
        if ratio > baseline * self.config.efficiency_drop_multiplier {
            return Some((
                AnomalyType::ProductionEfficiencyDrop,
                format!(
                    "单位能耗 {:.2} kWh/台 超过滚动基线 {:.2} kWh/台 的 {:.1} 倍",
                    ratio, baseline, self.config.efficiency_drop_multiplier
                ),
            ));
        }
        None
    }
}
