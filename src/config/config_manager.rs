// ==========================================
// 汽车工厂能效决策支持系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 阈值变更不需要重新编译检测逻辑
// ==========================================

use crate::config::detection_config::{DeadlineTable, DetectionConfig, PlannerConfig};
use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::playbook::RemediationPlaybook;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取 f64 配置,格式错误时告警并回退默认值
    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误,使用默认值");
            default
        }))
    }

    /// 读取 u64 配置,格式错误时告警并回退默认值
    fn get_u64_or(&self, key: &str, default: u64) -> Result<u64, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误,使用默认值");
            default
        }))
    }

    /// 读取 i64 配置,格式错误时告警并回退默认值
    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误,使用默认值");
            default
        }))
    }

    /// 写入配置值 (UPSERT, scope_id='global')
    ///
    /// # 用途
    /// - 部署初始化 / 运维调参 / 测试注入
    pub fn upsert_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取区域空调面积表 (JSON: {"ZONE-X": 1200.0, ...})
    ///
    /// 配置不存在或格式错误时返回空表 (不启用单位面积能效判定)
    fn get_zone_area_m2(&self) -> Result<HashMap<String, f64>, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::ZONE_AREA_M2, "{}")?;
        let map: HashMap<String, f64> = serde_json::from_str(&raw).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::ZONE_AREA_M2,
                raw_value = %raw,
                "区域面积表格式错误,使用空表"
            );
            HashMap::new()
        });
        Ok(map)
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_detection_config(&self) -> Result<DetectionConfig, Box<dyn Error>> {
        let defaults = DetectionConfig::default();
        Ok(DetectionConfig {
            paint_zone_marker: self.get_config_or_default(
                config_keys::PAINT_ZONE_MARKER,
                &defaults.paint_zone_marker,
            )?,
            paint_idle_energy_kwh: self.get_f64_or(
                config_keys::PAINT_IDLE_ENERGY_KWH,
                defaults.paint_idle_energy_kwh,
            )?,
            air_leak_m3: self.get_f64_or(config_keys::AIR_LEAK_M3, defaults.air_leak_m3)?,
            hvac_low_temp_c: self
                .get_f64_or(config_keys::HVAC_LOW_TEMP_C, defaults.hvac_low_temp_c)?,
            hvac_kwh_per_m2_limit: self.get_f64_or(
                config_keys::HVAC_KWH_PER_M2_LIMIT,
                defaults.hvac_kwh_per_m2_limit,
            )?,
            zone_area_m2: self.get_zone_area_m2()?,
            standby_energy_kwh: self.get_f64_or(
                config_keys::STANDBY_ENERGY_KWH,
                defaults.standby_energy_kwh,
            )?,
            efficiency_window: self
                .get_u64_or(config_keys::EFFICIENCY_WINDOW, defaults.efficiency_window as u64)?
                as usize,
            efficiency_drop_multiplier: self.get_f64_or(
                config_keys::EFFICIENCY_DROP_MULTIPLIER,
                defaults.efficiency_drop_multiplier,
            )?,
            scoring_timeout_ms: self.get_u64_or(
                config_keys::SCORING_TIMEOUT_MS,
                defaults.scoring_timeout_ms,
            )?,
        })
    }

    async fn get_planner_config(&self) -> Result<PlannerConfig, Box<dyn Error>> {
        let defaults = PlannerConfig::default();
        Ok(PlannerConfig {
            unit_cost_per_kwh: self.get_f64_or(
                config_keys::UNIT_COST_PER_KWH,
                defaults.unit_cost_per_kwh,
            )?,
            high_impact_cost_per_year: self.get_f64_or(
                config_keys::HIGH_IMPACT_COST_PER_YEAR,
                defaults.high_impact_cost_per_year,
            )?,
            deadline: DeadlineTable {
                high_hours: self
                    .get_i64_or(config_keys::DEADLINE_HOURS_HIGH, defaults.deadline.high_hours)?,
                medium_hours: self.get_i64_or(
                    config_keys::DEADLINE_HOURS_MEDIUM,
                    defaults.deadline.medium_hours,
                )?,
                low_hours: self
                    .get_i64_or(config_keys::DEADLINE_HOURS_LOW, defaults.deadline.low_hours)?,
            },
            air_to_kwh_factor: self.get_f64_or(
                config_keys::AIR_TO_KWH_FACTOR,
                defaults.air_to_kwh_factor,
            )?,
            hvac_est_kwh_per_hour: self.get_f64_or(
                config_keys::HVAC_EST_KWH_PER_HOUR,
                defaults.hvac_est_kwh_per_hour,
            )?,
            hvac_savings_fraction: self.get_f64_or(
                config_keys::HVAC_SAVINGS_FRACTION,
                defaults.hvac_savings_fraction,
            )?,
            standby_allowed_fraction: self.get_f64_or(
                config_keys::STANDBY_ALLOWED_FRACTION,
                defaults.standby_allowed_fraction,
            )?,
            model_excess_fraction: self.get_f64_or(
                config_keys::MODEL_EXCESS_FRACTION,
                defaults.model_excess_fraction,
            )?,
        })
    }

    async fn get_playbook(&self) -> Result<RemediationPlaybook, Box<dyn Error>> {
        match self.get_config_value(config_keys::REMEDIATION_PLAYBOOK)? {
            Some(raw) => match RemediationPlaybook::from_json(&raw) {
                Ok(playbook) if !playbook.is_empty() => Ok(playbook),
                Ok(_) => {
                    tracing::warn!("整改手册配置为空,使用内置手册");
                    Ok(RemediationPlaybook::default())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "整改手册配置格式错误,使用内置手册");
                    Ok(RemediationPlaybook::default())
                }
            },
            None => Ok(RemediationPlaybook::default()),
        }
    }

    async fn get_fusion_score_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or(config_keys::FUSION_SCORE_THRESHOLD, 0.5)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 规则检测阈值
    pub const PAINT_ZONE_MARKER: &str = "paint_zone_marker";
    pub const PAINT_IDLE_ENERGY_KWH: &str = "paint_idle_energy_kwh";
    pub const AIR_LEAK_M3: &str = "air_leak_m3";
    pub const HVAC_LOW_TEMP_C: &str = "hvac_low_temp_c";
    pub const HVAC_KWH_PER_M2_LIMIT: &str = "hvac_kwh_per_m2_limit";
    pub const ZONE_AREA_M2: &str = "zone_area_m2"; // 区域面积表 (JSON)
    pub const STANDBY_ENERGY_KWH: &str = "standby_energy_kwh";
    pub const EFFICIENCY_WINDOW: &str = "efficiency_window";
    pub const EFFICIENCY_DROP_MULTIPLIER: &str = "efficiency_drop_multiplier";

    // 外部评分服务
    pub const SCORING_TIMEOUT_MS: &str = "scoring_timeout_ms";
    pub const FUSION_SCORE_THRESHOLD: &str = "fusion_score_threshold";

    // 整改规划
    pub const UNIT_COST_PER_KWH: &str = "unit_cost_per_kwh";
    pub const HIGH_IMPACT_COST_PER_YEAR: &str = "high_impact_cost_per_year";
    pub const DEADLINE_HOURS_HIGH: &str = "deadline_hours_high";
    pub const DEADLINE_HOURS_MEDIUM: &str = "deadline_hours_medium";
    pub const DEADLINE_HOURS_LOW: &str = "deadline_hours_low";
    pub const AIR_TO_KWH_FACTOR: &str = "air_to_kwh_factor";
    pub const HVAC_EST_KWH_PER_HOUR: &str = "hvac_est_kwh_per_hour";
    pub const HVAC_SAVINGS_FRACTION: &str = "hvac_savings_fraction";
    pub const STANDBY_ALLOWED_FRACTION: &str = "standby_allowed_fraction";
    pub const MODEL_EXCESS_FRACTION: &str = "model_excess_fraction";
    pub const REMEDIATION_PLAYBOOK: &str = "remediation_playbook"; // 整改手册 (JSON)
}
