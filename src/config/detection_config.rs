// ==========================================
// 汽车工厂能效决策支持系统 - 引擎配置结构
// ==========================================
// 职责: 检测阈值 / 整改成本参数的配置快照
// 红线: 引擎不读 config_kv,构造时注入配置快照;
//       阈值全部具名可配,检测逻辑零内嵌常量
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// DetectionConfig - 规则检测配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 喷漆类区域标识子串 (zone_id 包含该子串即视为喷漆区)
    pub paint_zone_marker: String,
    /// 喷漆烘炉空转判定: 零产量时电耗高于该值 (kWh)
    pub paint_idle_energy_kwh: f64,
    /// 压缩空气泄漏判定: 低产量时气耗高于该值 (m³)
    pub air_leak_m3: f64,
    /// 过度制冷判定: 温度低于该值 (°C)
    pub hvac_low_temp_c: f64,
    /// 空调能效判定: 单位面积电耗上限 (kWh/m²)
    pub hvac_kwh_per_m2_limit: f64,
    /// 区域空调面积表 (m², 缺失的区域不参与能效判定)
    pub zone_area_m2: HashMap<String, f64>,
    /// 待机功耗判定: 待机状态电耗高于该值 (kWh)
    pub standby_energy_kwh: f64,
    /// 单位能耗劣化判定: 滚动基线窗口 (读数条数)
    pub efficiency_window: usize,
    /// 单位能耗劣化判定: 超出滚动基线的倍数
    pub efficiency_drop_multiplier: f64,
    /// 外部评分服务调用超时 (毫秒)
    pub scoring_timeout_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            paint_zone_marker: "PAINT".to_string(),
            paint_idle_energy_kwh: 150.0,
            air_leak_m3: 50.0,
            hvac_low_temp_c: 19.0,
            hvac_kwh_per_m2_limit: 0.5,
            zone_area_m2: HashMap::new(),
            standby_energy_kwh: 30.0,
            efficiency_window: 24,
            efficiency_drop_multiplier: 1.5,
            scoring_timeout_ms: 3_000,
        }
    }
}

// ==========================================
// DeadlineTable - 严重度 → 处置时限
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeadlineTable {
    pub high_hours: i64,
    pub medium_hours: i64,
    pub low_hours: i64,
}

impl Default for DeadlineTable {
    fn default() -> Self {
        Self {
            high_hours: 2,
            medium_hours: 24,
            low_hours: 72,
        }
    }
}

impl DeadlineTable {
    /// 按严重度取处置时限 (小时)
    pub fn hours_for(&self, severity: crate::domain::types::Severity) -> i64 {
        use crate::domain::types::Severity;
        match severity {
            Severity::High => self.high_hours,
            Severity::Medium => self.medium_hours,
            Severity::Low => self.low_hours,
        }
    }
}

// ==========================================
// PlannerConfig - 整改规划配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// 单位电价 (货币/kWh)
    pub unit_cost_per_kwh: f64,
    /// 高影响阈值: 年化成本超过该值时严重度升一级
    pub high_impact_cost_per_year: f64,
    /// 严重度 → 处置时限表
    pub deadline: DeadlineTable,
    /// 压缩空气折算电耗系数 (kWh/m³)
    pub air_to_kwh_factor: f64,
    /// 空调整改估算: 每小时基准电耗 (kWh)
    pub hvac_est_kwh_per_hour: f64,
    /// 空调整改估算: 调整可节约的比例
    pub hvac_savings_fraction: f64,
    /// 待机允许电耗占命中电耗的比例 (超出部分计为浪费)
    pub standby_allowed_fraction: f64,
    /// 劣化/模型检出异常: 命中电耗中计为超耗的比例
    pub model_excess_fraction: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            unit_cost_per_kwh: 0.07,
            high_impact_cost_per_year: 5_000.0,
            deadline: DeadlineTable::default(),
            air_to_kwh_factor: 0.1,
            hvac_est_kwh_per_hour: 100.0,
            hvac_savings_fraction: 0.25,
            standby_allowed_fraction: 0.15,
            model_excess_fraction: 0.2,
        }
    }
}
