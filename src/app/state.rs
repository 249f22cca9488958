// ==========================================
// 汽车工厂能效决策支持系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// 说明: 所有仓储/配置复用同一 SQLite 连接,保证 PRAGMA 一致
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::api::{DetectionApi, ForecastApi, WorkOrderApi};
use crate::config::{ConfigManager, EngineConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    AnomalyScoringService, DateSequenceGenerator, ForecastScoringService, LagMeanForecastService,
    OfflineScoringService,
};
use crate::importer::TelemetryImporter;
use crate::repository::{TelemetryRepository, WorkOrderRepository};

/// 应用状态
///
/// 包含所有 API 实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 遥测仓储
    pub telemetry_repo: Arc<TelemetryRepository>,

    /// 工单仓储
    pub work_order_repo: Arc<WorkOrderRepository>,

    /// 遥测导入引擎
    pub importer: Arc<TelemetryImporter>,

    /// 检测 API
    pub detection_api: Arc<DetectionApi>,

    /// 预测 API
    pub forecast_api: Arc<ForecastApi>,

    /// 工单 API
    pub work_order_api: Arc<WorkOrderApi>,
}

impl AppState {
    /// 以默认后端创建应用状态
    ///
    /// 默认后端: 离群评分离线 (检测退化为纯规则模式),
    /// 预测使用本地滞后均值统计后端
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        Self::with_services(
            db_path,
            Arc::new(OfflineScoringService),
            Arc::new(LagMeanForecastService),
        )
    }

    /// 以指定评分后端创建应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - scorer: 离群评分服务后端
    /// - forecaster: 预测回归服务后端
    pub fn with_services(
        db_path: &str,
        scorer: Arc<dyn AnomalyScoringService>,
        forecaster: Arc<dyn ForecastScoringService>,
    ) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let telemetry_repo = Arc::new(TelemetryRepository::from_connection(conn.clone()));
        let work_order_repo = Arc::new(WorkOrderRepository::from_connection(conn.clone()));
        let importer = Arc::new(TelemetryImporter::new(telemetry_repo.clone()));

        // 工单序号生成器为进程级单例,并发规划不冲突
        let id_generator = Arc::new(DateSequenceGenerator::new());

        let config_reader: Arc<dyn EngineConfigReader> = config_manager.clone();
        let detection_api = Arc::new(DetectionApi::new(
            telemetry_repo.clone(),
            work_order_repo.clone(),
            config_reader.clone(),
            scorer,
            id_generator,
        ));
        let forecast_api = Arc::new(ForecastApi::new(
            telemetry_repo.clone(),
            config_reader,
            forecaster,
        ));
        let work_order_api = Arc::new(WorkOrderApi::new(work_order_repo.clone()));

        Ok(Self {
            db_path: db_path.to_string(),
            config_manager,
            telemetry_repo,
            work_order_repo,
            importer,
            detection_api,
            forecast_api,
            work_order_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PLANT_GREENOPS_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径 (便于调试/测试/CI)
    if let Ok(path) = std::env::var("PLANT_GREENOPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./plant_greenops.db");

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("plant-greenops");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            path = app_dir.join("plant_greenops.db");
        }
    }

    path.to_string_lossy().to_string()
}
