// ==========================================
// 汽车工厂能效决策支持系统 - 引擎配置读取接口
// ==========================================
// 职责: 定义引擎配置读取 trait,隔离配置存储实现
// 说明: ConfigManager 为生产实现,测试可注入内存实现
// ==========================================

use crate::config::detection_config::{DetectionConfig, PlannerConfig};
use crate::config::playbook::RemediationPlaybook;
use async_trait::async_trait;
use std::error::Error;

/// 引擎配置读取接口
///
/// 所有方法对缺失配置返回内置默认值,配置格式错误时
/// 记录告警并回退默认值 (配置问题不得让检测链路瘫痪)
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// 读取规则检测配置
    async fn get_detection_config(&self) -> Result<DetectionConfig, Box<dyn Error>>;

    /// 读取整改规划配置
    async fn get_planner_config(&self) -> Result<PlannerConfig, Box<dyn Error>>;

    /// 读取整改手册
    async fn get_playbook(&self) -> Result<RemediationPlaybook, Box<dyn Error>>;

    /// 读取融合评分阈值 (默认 0.5)
    async fn get_fusion_score_threshold(&self) -> Result<f64, Box<dyn Error>>;
}
