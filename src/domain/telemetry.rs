// ==========================================
// 汽车工厂能效决策支持系统 - 遥测领域模型
// ==========================================
// 职责: 区域小时级遥测读数与查询条件
// 红线: 读数一经入库不可变更,引擎只读消费
// ==========================================

use crate::domain::types::{ShiftCode, ZoneStatus};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ==========================================
// ZoneReading - 区域小时读数
// ==========================================
// 对齐: zone_reading 表
// 口径: 一行 = 一个区域一个整点小时的观测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    pub zone_id: String,               // 区域标识 (如 ZONE-PAINT-SHOP)
    pub timestamp: NaiveDateTime,      // 整点时间戳
    pub energy_kwh: f64,               // 电耗 (kWh)
    pub production_units: i64,         // 产量 (台)
    pub co2_kg: f64,                   // 碳排 (kg)
    pub temperature_c: Option<f64>,    // 温度 (°C, 传感器缺失时为 None)
    pub compressed_air_m3: f64,        // 压缩空气用量 (m³)
    pub shift: ShiftCode,              // 班次
    pub status: ZoneStatus,            // 运行状态
}

impl ZoneReading {
    /// 数据质量检查
    ///
    /// # 返回
    /// - None: 读数可用
    /// - Some(reason): 读数畸形,应跳过并计数 (不中断批次)
    pub fn quality_issue(&self) -> Option<&'static str> {
        if self.zone_id.trim().is_empty() {
            return Some("zone_id 为空");
        }
        if !self.energy_kwh.is_finite() || self.energy_kwh < 0.0 {
            return Some("energy_kwh 非法");
        }
        if self.production_units < 0 {
            return Some("production_units 为负");
        }
        if !self.compressed_air_m3.is_finite() || self.compressed_air_m3 < 0.0 {
            return Some("compressed_air_m3 非法");
        }
        if let Some(t) = self.temperature_c {
            if !t.is_finite() {
                return Some("temperature_c 非法");
            }
        }
        if self.timestamp.minute() != 0 || self.timestamp.second() != 0 {
            return Some("timestamp 未对齐整点");
        }
        None
    }

    /// 单位能耗 (kWh/台, 零产量时取产量=1 避免除零)
    pub fn energy_per_unit(&self) -> f64 {
        self.energy_kwh / (self.production_units.max(1) as f64)
    }

    /// 单位气耗 (m³/台, 口径同上)
    pub fn air_per_unit(&self) -> f64 {
        self.compressed_air_m3 / (self.production_units.max(1) as f64)
    }
}

// ==========================================
// ReadingFilter - 读数查询条件
// ==========================================
// 用途: TelemetryRepository 查询参数 (全部可选, 组合过滤)
#[derive(Debug, Clone, Default)]
pub struct ReadingFilter {
    pub zone_id: Option<String>,
    pub shift: Option<ShiftCode>,
    pub status: Option<ZoneStatus>,
    pub from: Option<NaiveDateTime>, // 含
    pub to: Option<NaiveDateTime>,   // 含
}

// ==========================================
// HourlyEnergyPoint - 全厂小时电耗聚合点
// ==========================================
// 用途: 预测引擎输入 (各区域按小时求和后的序列)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyEnergyPoint {
    pub timestamp: NaiveDateTime, // 整点时间戳
    pub energy_kwh: f64,          // 该小时全部区域电耗之和
}

// ==========================================
// WindowKpis - 窗口级 KPI 汇总
// ==========================================
// 用途: 报表输出 (CLI / 通知摘要)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowKpis {
    pub total_energy_kwh: f64,
    pub total_co2_kg: f64,
    pub total_units: i64,
    pub energy_per_unit_kwh: Option<f64>, // 零产量窗口为 None
    pub zone_energy: Vec<ZoneEnergyShare>,
}

/// 分区域电耗占比
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEnergyShare {
    pub zone_id: String,
    pub energy_kwh: f64,
    pub share_pct: f64,
}

impl WindowKpis {
    /// 从读数窗口计算 KPI
    pub fn from_readings(readings: &[ZoneReading]) -> Self {
        let total_energy_kwh: f64 = readings.iter().map(|r| r.energy_kwh).sum();
        let total_co2_kg: f64 = readings.iter().map(|r| r.co2_kg).sum();
        let total_units: i64 = readings.iter().map(|r| r.production_units).sum();

        let energy_per_unit_kwh = if total_units > 0 {
            Some(total_energy_kwh / total_units as f64)
        } else {
            None
        };

        // 分区域聚合 (保持首次出现顺序, 输出稳定)
        let mut zone_order: Vec<String> = Vec::new();
        let mut zone_totals: std::collections::HashMap<String, f64> =
            std::collections::HashMap::new();
        for r in readings {
            if !zone_totals.contains_key(&r.zone_id) {
                zone_order.push(r.zone_id.clone());
            }
            *zone_totals.entry(r.zone_id.clone()).or_insert(0.0) += r.energy_kwh;
        }

        let zone_energy = zone_order
            .into_iter()
            .map(|zone_id| {
                let energy = zone_totals[&zone_id];
                let share = if total_energy_kwh > 0.0 {
                    energy / total_energy_kwh * 100.0
                } else {
                    0.0
                };
                ZoneEnergyShare {
                    zone_id,
                    energy_kwh: energy,
                    share_pct: share,
                }
            })
            .collect();

        WindowKpis {
            total_energy_kwh,
            total_co2_kg,
            total_units,
            energy_per_unit_kwh,
            zone_energy,
        }
    }
}
