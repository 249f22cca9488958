// ==========================================
// 汽车工厂能效决策支持系统 - 外部评分服务接口
// ==========================================
// 职责: 定义离群评分/预测回归服务 trait,实现依赖倒置
// 说明: Engine 层定义 trait,具体后端 (托管模型/本地统计模型/测试桩)
//       在外部实现,检测与预测逻辑对后端无感知
// 红线: 特征顺序与命名由模型契约固定,重排或缺失会静默污染评分,
//       因此请求结构必须携带字段名,响应校验必须显式失败
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// 特征契约
// ==========================================

/// 离群检测模型的特征字段 (顺序即契约)
pub const ANOMALY_FEATURE_FIELDS: [&str; 8] = [
    "energy_kwh",
    "production_units",
    "temperature_c",
    "compressed_air_m3",
    "shift_encoded",
    "zone_encoded",
    "energy_per_unit",
    "air_per_unit",
];

/// 预测回归模型的特征字段 (顺序即契约)
pub const FORECAST_FEATURE_FIELDS: [&str; 10] = [
    "lag_1h",
    "lag_3h",
    "lag_6h",
    "lag_12h",
    "lag_24h",
    "rolling_mean_24h",
    "rolling_std_24h",
    "hour_of_day",
    "day_of_week",
    "is_weekend",
];

// ==========================================
// 请求/响应结构
// ==========================================

/// 评分请求: 有序数值特征矩阵 + 字段名
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ScoringRequest {
    /// 构造请求
    pub fn new(fields: &[&str], rows: Vec<Vec<f64>>) -> Self {
        Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }
}

/// 离群模型单条输出: 二元标签 + [0,1] 连续评分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub label: u8,  // 0=正常, 1=异常
    pub score: f64, // 异常概率
}

impl ModelScore {
    /// 契约校验
    ///
    /// # 返回
    /// - None: 合法
    /// - Some(reason): 违反契约 (调用方应上报 ScoringUnavailable 而非静默纠正)
    pub fn contract_violation(&self) -> Option<String> {
        if self.label > 1 {
            return Some(format!("label={} 非法 (合法值 0|1)", self.label));
        }
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Some(format!("score={} 越界 (合法区间 [0,1])", self.score));
        }
        None
    }
}

// ==========================================
// 评分服务 Trait
// ==========================================

/// 离群评分服务
///
/// 请求 = 有序特征矩阵 (一行一读数), 响应 = 等长的 {label, score} 序列。
/// 行数不匹配或任一输出越界均视为契约违反,由适配器上报
/// ScoringUnavailable。
#[async_trait]
pub trait AnomalyScoringService: Send + Sync {
    /// 批量评分
    async fn score(&self, request: &ScoringRequest) -> anyhow::Result<Vec<ModelScore>>;
}

/// 预测回归服务
///
/// 请求 = 单行有序特征向量 (滞后项 + 滚动统计 + 日历特征),
/// 响应 = 单个标量 (下一小时电耗预测)。
#[async_trait]
pub trait ForecastScoringService: Send + Sync {
    /// 单步预测
    async fn predict(&self, request: &ScoringRequest) -> anyhow::Result<f64>;
}

// ==========================================
// 内置后端实现
// ==========================================

/// 离线评分服务: 始终报告不可用
///
/// 用途: 未配置模型后端时的默认实现,检测链路自动退化为纯规则模式
pub struct OfflineScoringService;

#[async_trait]
impl AnomalyScoringService for OfflineScoringService {
    async fn score(&self, _request: &ScoringRequest) -> anyhow::Result<Vec<ModelScore>> {
        anyhow::bail!("未配置离群评分后端")
    }
}

#[async_trait]
impl ForecastScoringService for OfflineScoringService {
    async fn predict(&self, _request: &ScoringRequest) -> anyhow::Result<f64> {
        anyhow::bail!("未配置预测回归后端")
    }
}

/// 滞后均值预测服务: 本地统计后端
///
/// 返回 5 个滞后特征的算术平均,作为无托管模型环境下的保底预测。
/// 平稳序列在该后端下保持不变 (递推不引入漂移)。
pub struct LagMeanForecastService;

#[async_trait]
impl ForecastScoringService for LagMeanForecastService {
    async fn predict(&self, request: &ScoringRequest) -> anyhow::Result<f64> {
        let row = request
            .rows
            .first()
            .ok_or_else(|| anyhow::anyhow!("预测请求特征矩阵为空"))?;
        if row.len() < 5 {
            anyhow::bail!("预测请求特征不足 5 个滞后项");
        }
        // 前 5 列为 lag_1h..lag_24h
        Ok(row[..5].iter().sum::<f64>() / 5.0)
    }
}
