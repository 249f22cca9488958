// ==========================================
// 汽车工厂能效决策支持系统 - 遥测数据仓储
// ==========================================
// 职责: 管理 zone_reading 表的写入与只读查询
// 红线: Repository 不含业务逻辑; 查询结果按时间非降序返回
//       (规则基线与预测逻辑依赖该顺序)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::telemetry::{HourlyEnergyPoint, ReadingFilter, ZoneReading};
use crate::domain::types::{ShiftCode, ZoneStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式 (ISO, 字典序与时间序一致)
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==========================================
// TelemetryRepository - 遥测仓储
// ==========================================
pub struct TelemetryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TelemetryRepository {
    /// 创建新的 TelemetryRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入 (导入链路专用)
    // ==========================================

    /// 批量写入读数 (INSERT OR REPLACE, 键: zone_id + timestamp)
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    ///
    /// # 说明
    /// 使用事务确保批次原子性
    pub fn batch_upsert(&self, readings: &[ZoneReading]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for reading in readings {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO zone_reading (
                    zone_id, timestamp, energy_kwh, production_units, co2_kg,
                    temperature_c, compressed_air_m3, shift, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                rusqlite::params![
                    reading.zone_id,
                    reading.timestamp.format(TS_FORMAT).to_string(),
                    reading.energy_kwh,
                    reading.production_units,
                    reading.co2_kg,
                    reading.temperature_c,
                    reading.compressed_air_m3,
                    reading.shift.to_db_str(),
                    reading.status.to_db_str(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    // ==========================================
    // 只读查询
    // ==========================================

    /// 按条件查询读数 (时间非降序, 同小时内按区域排序)
    ///
    /// # 参数
    /// - filter: 组合过滤条件 (区域/班次/状态/时间范围,全部可选)
    pub fn find_readings(&self, filter: &ReadingFilter) -> RepositoryResult<Vec<ZoneReading>> {
        let mut sql = String::from(
            r#"
            SELECT zone_id, timestamp, energy_kwh, production_units, co2_kg,
                   temperature_c, compressed_air_m3, shift, status
            FROM zone_reading
            WHERE 1=1
            "#,
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(zone_id) = &filter.zone_id {
            sql.push_str(&format!(" AND zone_id = ?{}", args.len() + 1));
            args.push(zone_id.clone());
        }
        if let Some(shift) = filter.shift {
            sql.push_str(&format!(" AND shift = ?{}", args.len() + 1));
            args.push(shift.to_db_str().to_string());
        }
        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", args.len() + 1));
            args.push(status.to_db_str().to_string());
        }
        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND timestamp >= ?{}", args.len() + 1));
            args.push(from.format(TS_FORMAT).to_string());
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND timestamp <= ?{}", args.len() + 1));
            args.push(to.format(TS_FORMAT).to_string());
        }

        sql.push_str(" ORDER BY timestamp ASC, zone_id ASC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), Self::map_reading_row)?;

        let mut readings = Vec::new();
        for row in rows {
            readings.push(row?);
        }
        Ok(readings)
    }

    /// 全厂小时电耗聚合序列 (各区域按小时求和, 时间升序)
    ///
    /// # 参数
    /// - zone_id: 可选区域过滤 (None 为全厂口径)
    /// - from/to: 可选时间范围 (含)
    ///
    /// # 说明
    /// 缺失小时不补齐 — 缺口策略由预测入口判定 (拒绝而非插值)
    pub fn load_hourly_energy_series(
        &self,
        zone_id: Option<&str>,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> RepositoryResult<Vec<HourlyEnergyPoint>> {
        let mut sql = String::from(
            "SELECT timestamp, SUM(energy_kwh) FROM zone_reading WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(zone) = zone_id {
            sql.push_str(&format!(" AND zone_id = ?{}", args.len() + 1));
            args.push(zone.to_string());
        }
        if let Some(from) = from {
            sql.push_str(&format!(" AND timestamp >= ?{}", args.len() + 1));
            args.push(from.format(TS_FORMAT).to_string());
        }
        if let Some(to) = to {
            sql.push_str(&format!(" AND timestamp <= ?{}", args.len() + 1));
            args.push(to.format(TS_FORMAT).to_string());
        }

        sql.push_str(" GROUP BY timestamp ORDER BY timestamp ASC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut series = Vec::new();
        for row in rows {
            let (ts_raw, energy_kwh) = row?;
            let timestamp = parse_ts(&ts_raw)?;
            series.push(HourlyEnergyPoint {
                timestamp,
                energy_kwh,
            });
        }
        Ok(series)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_reading_row(row: &Row<'_>) -> rusqlite::Result<ZoneReading> {
        let ts_raw: String = row.get(1)?;
        let shift_raw: String = row.get(7)?;
        let status_raw: String = row.get(8)?;

        Ok(ZoneReading {
            zone_id: row.get(0)?,
            timestamp: parse_ts(&ts_raw)?,
            energy_kwh: row.get(2)?,
            production_units: row.get(3)?,
            co2_kg: row.get(4)?,
            temperature_c: row.get(5)?,
            compressed_air_m3: row.get(6)?,
            shift: ShiftCode::from_str(&shift_raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    format!("非法班次: {}", shift_raw).into(),
                )
            })?,
            status: ZoneStatus::from_str(&status_raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    format!("非法运行状态: {}", status_raw).into(),
                )
            })?,
        })
    }
}

/// 解析存储格式的时间戳
fn parse_ts(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("非法时间戳 {}: {}", raw, e).into(),
        )
    })
}
