// ==========================================
// 汽车工厂能效决策支持系统 - 导入层
// ==========================================
// 职责: 外部遥测数据接入 (CSV)
// ==========================================

pub mod telemetry_importer;

pub use telemetry_importer::{ImportViolation, TelemetryImporter, TelemetryImportResult};
