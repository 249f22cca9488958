// ==========================================
// 汽车工厂能效决策支持系统 - 应用层
// ==========================================
// 职责: 应用状态装配与入口支撑
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
