// ==========================================
// 汽车工厂能效决策支持系统 - 预测领域模型
// ==========================================
// 职责: 递推式电耗预测的输出结构
// 口径: 每次预测请求现算现返,不落库
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 预测时域上限 (小时): 7 天
pub const MAX_FORECAST_HORIZON: u32 = 168;

// ==========================================
// ForecastPoint - 单小时预测点
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub hour_offset: u32,             // 距历史末端的偏移 (1..=H)
    pub predicted_energy_kwh: f64,    // 预测电耗
    pub timestamp: NaiveDateTime,     // 预测点对应的整点时间
}

// ==========================================
// ForecastReport - 预测报告
// ==========================================
// 说明: 递推预测的误差随 hour_offset 增大而累积,
//       期望意义下精度单调劣化,远端点仅作趋势参考
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub points: Vec<ForecastPoint>,
    pub history_hours: usize,    // 参与预测的真实历史小时数
    pub degraded: bool,          // 历史不足 24 小时,滚动特征按可用窗口均值补齐
    pub total_predicted_kwh: f64,
    pub average_per_hour_kwh: f64,
}

impl ForecastReport {
    /// 从预测点序列构造报告
    pub fn new(points: Vec<ForecastPoint>, history_hours: usize, degraded: bool) -> Self {
        let total: f64 = points.iter().map(|p| p.predicted_energy_kwh).sum();
        let avg = if points.is_empty() {
            0.0
        } else {
            total / points.len() as f64
        };
        Self {
            points,
            history_hours,
            degraded,
            total_predicted_kwh: total,
            average_per_hour_kwh: avg,
        }
    }
}
