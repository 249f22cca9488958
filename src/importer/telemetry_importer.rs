// ==========================================
// 汽车工厂能效决策支持系统 - 遥测导入引擎
// ==========================================
// 职责: CSV 解析 + 字段校验 + 数据质量检查 + 批量入库
// 红线: 单行畸形跳过并记录违规,绝不中断批次;
//       导入结果必须标注跳过数量与原因
// ==========================================

use crate::domain::telemetry::ZoneReading;
use crate::domain::types::{ShiftCode, ZoneStatus};
use crate::repository::TelemetryRepository;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 导入结果结构
// ==========================================

/// 单行违规记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportViolation {
    pub row: usize,       // CSV 行号 (1 起算,不含表头)
    pub field: String,    // 出错字段
    pub reason: String,   // 违规原因
}

/// 导入结果 (批次信息 + 统计)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryImportResult {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub violations: Vec<ImportViolation>,
    pub elapsed_ms: i64,
}

// ==========================================
// 原始行结构 (CSV 反序列化用,宽松类型)
// ==========================================
#[derive(Debug, Deserialize)]
struct RawTelemetryRow {
    timestamp: String,
    zone_id: String,
    energy_kwh: Option<f64>,
    co2_kg: Option<f64>,
    production_units: Option<i64>,
    compressed_air_m3: Option<f64>,
    temperature_c: Option<f64>,
    shift: String,
    status: String,
}

// ==========================================
// TelemetryImporter - 遥测导入引擎
// ==========================================
pub struct TelemetryImporter {
    repo: Arc<TelemetryRepository>,
}

impl TelemetryImporter {
    /// 创建新的 TelemetryImporter 实例
    ///
    /// # 参数
    /// - repo: 遥测仓储
    pub fn new(repo: Arc<TelemetryRepository>) -> Self {
        Self { repo }
    }

    /// 从 CSV 文件导入遥测数据 (主入口)
    ///
    /// # 参数
    /// - file_path: CSV 文件路径
    ///
    /// # 返回
    /// - TelemetryImportResult: 批次信息 + 导入/跳过统计 + 违规明细
    ///
    /// # 流程
    /// 1. 解析 CSV → 原始行
    /// 2. 字段校验与映射 → ZoneReading (畸形行记录违规并跳过)
    /// 3. 数据质量复检 (与检测引擎同口径)
    /// 4. 批量入库 (事务化, 键冲突覆盖)
    pub fn import_from_csv(&self, file_path: &str) -> Result<TelemetryImportResult, Box<dyn Error>> {
        let start_time = std::time::Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        tracing::info!(batch_id = %batch_id, file = file_path, "开始导入遥测数据");

        let mut csv_reader = csv::Reader::from_path(file_path)?;
        let mut readings = Vec::new();
        let mut violations = Vec::new();
        let mut total_rows = 0usize;

        for (idx, row) in csv_reader.deserialize::<RawTelemetryRow>().enumerate() {
            let row_no = idx + 1;
            total_rows += 1;

            let raw = match row {
                Ok(raw) => raw,
                Err(e) => {
                    violations.push(ImportViolation {
                        row: row_no,
                        field: "*".to_string(),
                        reason: format!("行解析失败: {}", e),
                    });
                    continue;
                }
            };

            match Self::map_row(&raw) {
                Ok(reading) => {
                    // 数据质量复检 (与检测引擎同口径)
                    if let Some(reason) = reading.quality_issue() {
                        violations.push(ImportViolation {
                            row: row_no,
                            field: "*".to_string(),
                            reason: reason.to_string(),
                        });
                        continue;
                    }
                    readings.push(reading);
                }
                Err((field, reason)) => {
                    violations.push(ImportViolation {
                        row: row_no,
                        field,
                        reason,
                    });
                }
            }
        }

        let imported = self.repo.batch_upsert(&readings)?;
        let elapsed_ms = start_time.elapsed().as_millis() as i64;

        let result = TelemetryImportResult {
            batch_id: batch_id.clone(),
            total_rows,
            imported,
            skipped: violations.len(),
            violations,
            elapsed_ms,
        };

        tracing::info!(
            batch_id = %batch_id,
            total = result.total_rows,
            imported = result.imported,
            skipped = result.skipped,
            elapsed_ms,
            "遥测导入完成"
        );

        Ok(result)
    }

    // ==========================================
    // 字段校验与映射
    // ==========================================

    /// 原始行 → ZoneReading
    ///
    /// # 返回
    /// - Err((field, reason)): 字段级违规
    fn map_row(raw: &RawTelemetryRow) -> Result<ZoneReading, (String, String)> {
        let timestamp = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| ("timestamp".to_string(), format!("无法解析: {}", raw.timestamp)))?;

        if raw.zone_id.trim().is_empty() {
            return Err(("zone_id".to_string(), "为空".to_string()));
        }

        let energy_kwh = raw
            .energy_kwh
            .ok_or_else(|| ("energy_kwh".to_string(), "缺失".to_string()))?;

        let shift = ShiftCode::from_str(&raw.shift)
            .ok_or_else(|| ("shift".to_string(), format!("非法班次: {}", raw.shift)))?;

        let status = ZoneStatus::from_str(&raw.status)
            .ok_or_else(|| ("status".to_string(), format!("非法状态: {}", raw.status)))?;

        Ok(ZoneReading {
            zone_id: raw.zone_id.trim().to_string(),
            timestamp,
            energy_kwh,
            production_units: raw.production_units.unwrap_or(0),
            co2_kg: raw.co2_kg.unwrap_or(0.0),
            temperature_c: raw.temperature_c,
            compressed_air_m3: raw.compressed_air_m3.unwrap_or(0.0),
            shift,
            status,
        })
    }
}

/// 解析时间戳 (兼容空格与 T 两种分隔)
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::telemetry::ReadingFilter;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;

    fn setup() -> (Arc<TelemetryRepository>, TelemetryImporter) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let repo = Arc::new(TelemetryRepository::from_connection(Arc::new(Mutex::new(
            conn,
        ))));
        let importer = TelemetryImporter::new(repo.clone());
        (repo, importer)
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const HEADER: &str =
        "timestamp,zone_id,energy_kwh,co2_kg,production_units,compressed_air_m3,temperature_c,shift,status\n";

    #[test]
    fn test_import_valid_rows() {
        let (repo, importer) = setup();
        let csv = format!(
            "{}2026-03-02 08:00:00,ZONE-PAINT-SHOP,180.5,148.0,12,30.2,22.5,SHIFT-A,OPERATIONAL\n\
             2026-03-02 09:00:00,ZONE-PAINT-SHOP,175.0,143.5,11,29.8,22.0,SHIFT-A,OPERATIONAL\n",
            HEADER
        );
        let file = write_csv(&csv);

        let result = importer.import_from_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.imported, 2);
        assert_eq!(result.skipped, 0);

        let readings = repo.find_readings(&ReadingFilter::default()).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].energy_kwh, 180.5);
    }

    #[test]
    fn test_malformed_rows_skipped_with_violations() {
        let (repo, importer) = setup();
        let csv = format!(
            "{}2026-03-02 08:00:00,ZONE-A,100.0,82.0,5,10.0,21.0,SHIFT-A,OPERATIONAL\n\
             bad-timestamp,ZONE-A,100.0,82.0,5,10.0,21.0,SHIFT-A,OPERATIONAL\n\
             2026-03-02 10:00:00,ZONE-A,100.0,82.0,5,10.0,21.0,SHIFT-X,OPERATIONAL\n\
             2026-03-02 11:00:00,ZONE-A,100.0,82.0,5,10.0,21.0,SHIFT-A,UNKNOWN\n",
            HEADER
        );
        let file = write_csv(&csv);

        let result = importer.import_from_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(result.total_rows, 4);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 3);
        assert_eq!(result.violations.len(), 3);
        assert_eq!(result.violations[0].field, "timestamp");
        assert_eq!(result.violations[1].field, "shift");
        assert_eq!(result.violations[2].field, "status");

        // 批次未被畸形行中断
        assert_eq!(repo.find_readings(&ReadingFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_temperature_is_allowed() {
        let (repo, importer) = setup();
        let csv = format!(
            "{}2026-03-02 08:00:00,ZONE-A,100.0,82.0,5,10.0,,SHIFT-B,STANDBY\n",
            HEADER
        );
        let file = write_csv(&csv);

        let result = importer.import_from_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(result.imported, 1);

        let readings = repo.find_readings(&ReadingFilter::default()).unwrap();
        assert_eq!(readings[0].temperature_c, None);
        assert_eq!(readings[0].status, ZoneStatus::Standby);
    }

    #[test]
    fn test_non_hour_aligned_timestamp_rejected() {
        let (_, importer) = setup();
        let csv = format!(
            "{}2026-03-02 08:30:00,ZONE-A,100.0,82.0,5,10.0,21.0,SHIFT-A,OPERATIONAL\n",
            HEADER
        );
        let file = write_csv(&csv);

        let result = importer.import_from_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(result.imported, 0);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.violations[0].reason, "timestamp 未对齐整点");
    }
}
