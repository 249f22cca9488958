// ==========================================
// 汽车工厂能效决策支持系统 - 工单 API
// ==========================================
// 职责: 工单排序查询 / 状态流转 / 通知载荷
// 架构: API 层 → WorkOrderRepository + PriorityRanker/
//       NotificationFormatter
// 红线: 排序只消费活动工单子集; 通知只产出载荷不投递
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::remediation::{NotificationPayload, PriorityEntry, RemediationPlan};
use crate::domain::types::WorkOrderStatus;
use crate::engine::{NotificationFormatter, PriorityRanker};
use crate::repository::WorkOrderRepository;
use std::sync::Arc;

// ==========================================
// WorkOrderApi - 工单 API
// ==========================================
pub struct WorkOrderApi {
    work_order_repo: Arc<WorkOrderRepository>,
}

impl WorkOrderApi {
    /// 创建新的 WorkOrderApi 实例
    pub fn new(work_order_repo: Arc<WorkOrderRepository>) -> Self {
        Self { work_order_repo }
    }

    /// 按优先级列出活动工单
    ///
    /// # 参数
    /// - limit: 可选 top-N (排序后截断)
    /// - zone_filter: 可选区域过滤 (排序后过滤)
    pub fn list_ranked(
        &self,
        limit: Option<usize>,
        zone_filter: Option<&str>,
    ) -> ApiResult<Vec<PriorityEntry>> {
        let active = self.work_order_repo.list_active()?;
        Ok(PriorityRanker::new().rank(active, limit, zone_filter))
    }

    /// 查询单张工单
    pub fn get(&self, work_order_id: &str) -> ApiResult<RemediationPlan> {
        self.work_order_repo
            .find_by_id(work_order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工单 {} 不存在", work_order_id)))
    }

    /// 工单状态流转 (追踪协作方入口, 状态机校验)
    pub fn update_status(
        &self,
        work_order_id: &str,
        target: WorkOrderStatus,
    ) -> ApiResult<()> {
        if work_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单号不能为空".to_string()));
        }
        self.work_order_repo
            .update_status(work_order_id, target)
            .map_err(Into::into)
    }

    /// 生成工单通知载荷 (供通知协作方投递)
    pub fn notification_payload(&self, work_order_id: &str) -> ApiResult<NotificationPayload> {
        let plan = self.get(work_order_id)?;
        Ok(NotificationFormatter::new().format(&plan))
    }
}
