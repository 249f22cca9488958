// ==========================================
// 汽车工厂能效决策支持系统 - 引擎层错误类型
// ==========================================
// 职责: 检测/预测/整改引擎的统一错误口径
// 工具: thiserror 派生宏
// 红线: 所有错误信息必须包含显式原因 (可解释性)
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
///
/// 传播口径:
/// - 检测/融合: 逐条读数,单条畸形不影响批次 (畸形读数计数而非报错)
/// - 预测: 逐请求,任一步失败终止整个时域 (部分递推结果具有误导性)
/// - 整改规划: 逐异常,未映射类型硬失败而非静默编造通用方案
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 外部评分服务错误 =====
    /// 离群评分服务不可用或响应违反契约
    /// 调用方口径: "无模型贡献",绝不解释为"无异常"
    #[error("离群评分服务不可用: {0}")]
    ScoringUnavailable(String),

    /// 预测回归服务不可用或响应违反契约
    /// 递推预测无法在缺少服务的情况下继续,整个请求终止
    #[error("预测服务不可用 (第{hour}小时): {reason}")]
    ForecastServiceUnavailable { hour: u32, reason: String },

    // ===== 调用方输入错误 =====
    /// 预测时域越界 (合法区间 1..=168),在任何服务调用前拒绝
    #[error("非法预测时域: h={0} (合法区间 1..=168)")]
    InvalidHorizon(u32),

    /// 历史序列存在时间缺口 (缺失小时),上游未补齐则拒绝
    #[error("历史序列存在时间缺口: {0} 之后不连续")]
    NonContiguousSeries(chrono::NaiveDateTime),

    /// 历史序列为空
    #[error("历史序列为空,无法预测")]
    EmptySeries,

    // ===== 整改规划错误 =====
    /// 异常类型在整改手册中无映射 (检测器与手册之间存在配置缺口)
    #[error("未映射的异常类型: {0} (整改手册缺失条目)")]
    UnknownAnomalyType(String),

    /// 工单号重复 (原子序号下结构上不可能,出现即为缺陷,上报不自动纠正)
    #[error("工单号重复: {0} (序号生成器缺陷)")]
    DuplicateWorkOrder(String),

    // ===== 通用错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
