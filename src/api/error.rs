// ==========================================
// 汽车工厂能效决策支持系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换仓储/引擎错误为用户可读的错误消息
// 红线: 可解释性 — 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 外部服务降级错误
    // ==========================================
    /// 离群评分服务不可用 (检测链路已退化为纯规则模式时不会上抛)
    #[error("离群评分服务不可用: {0}")]
    ScoringUnavailable(String),

    /// 预测服务不可用 (预测请求整体失败)
    #[error("预测服务不可用: {0}")]
    ForecastUnavailable(String),

    // ==========================================
    // 整改规划错误
    // ==========================================
    #[error("未映射的异常类型: {0}")]
    UnknownAnomalyType(String),

    /// 工单号重复: 序号生成器缺陷,上报不自动纠正
    #[error("工单号重复 (生成器缺陷): {0}")]
    DuplicateWorkOrder(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                // 工单表唯一约束冲突 = 序号生成器缺陷
                if msg.contains("work_order") {
                    ApiError::DuplicateWorkOrder(msg)
                } else {
                    ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
                }
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ScoringUnavailable(msg) => ApiError::ScoringUnavailable(msg),
            EngineError::ForecastServiceUnavailable { hour, reason } => {
                ApiError::ForecastUnavailable(format!("第{}小时: {}", hour, reason))
            }
            EngineError::InvalidHorizon(h) => {
                ApiError::InvalidInput(format!("非法预测时域: {} (合法区间 1..=168)", h))
            }
            EngineError::NonContiguousSeries(ts) => {
                ApiError::ValidationError(format!("历史序列存在时间缺口: {} 之后不连续", ts))
            }
            EngineError::EmptySeries => {
                ApiError::ValidationError("历史序列为空,无法预测".to_string())
            }
            EngineError::UnknownAnomalyType(t) => ApiError::UnknownAnomalyType(t),
            EngineError::DuplicateWorkOrder(id) => ApiError::DuplicateWorkOrder(id),
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "WorkOrder".to_string(),
            id: "WO-1".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("WorkOrder"));
                assert!(msg.contains("WO-1"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_work_order_unique_violation_is_duplicate_defect() {
        let repo_err = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: work_order.work_order_id".to_string(),
        );
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::DuplicateWorkOrder(_)));
    }

    #[test]
    fn test_engine_error_conversion() {
        let api_err: ApiError = EngineError::InvalidHorizon(200).into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));

        let api_err: ApiError = EngineError::UnknownAnomalyType("X".to_string()).into();
        assert!(matches!(api_err, ApiError::UnknownAnomalyType(_)));
    }
}
