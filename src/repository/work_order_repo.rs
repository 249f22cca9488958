// ==========================================
// 汽车工厂能效决策支持系统 - 整改工单数据仓储
// ==========================================
// 职责: 管理 work_order 表的持久化与状态流转
// 红线: Repository 不含业务逻辑; 状态转换按工单状态机校验;
//       工单号唯一约束兜底 (冲突即缺陷,上报不自动纠正)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::remediation::{FinancialImpact, RemediationPlan};
use crate::domain::types::{AnomalyType, Severity, WorkOrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式 (ISO)
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==========================================
// WorkOrderRepository - 整改工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的 WorkOrderRepository 实例
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
    // 写入
    // ==========================================

    /// 插入新工单 (工单号冲突 → UniqueConstraintViolation)
    pub fn insert(&self, plan: &RemediationPlan) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO work_order (
                work_order_id, anomaly_type, zone_id, severity,
                waste_kwh_per_hour, cost_per_hour, cost_per_day, cost_per_year,
                fix_steps_json, assigned_team, detected_at, deadline,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                plan.work_order_id,
                plan.anomaly_type.to_db_str(),
                plan.zone_id,
                plan.severity.to_db_str(),
                plan.impact.waste_kwh_per_hour,
                plan.impact.cost_per_hour,
                plan.impact.cost_per_day,
                plan.impact.cost_per_year,
                serde_json::to_string(&plan.fix_steps)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                plan.assigned_team,
                plan.detected_at.format(TS_FORMAT).to_string(),
                plan.deadline.format(TS_FORMAT).to_string(),
                plan.status.to_db_str(),
                plan.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 更新工单状态 (按状态机校验转换合法性)
    ///
    /// # 返回
    /// - Ok(()): 转换成功
    /// - Err(NotFound): 工单不存在
    /// - Err(InvalidStateTransition): 转换不合法 (含 RESOLVED 终态)
    pub fn update_status(
        &self,
        work_order_id: &str,
        target: WorkOrderStatus,
    ) -> RepositoryResult<()> {
        let current = self
            .find_by_id(work_order_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: work_order_id.to_string(),
            })?
            .status;

        if !current.can_transition_to(target) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE work_order SET status = ?1 WHERE work_order_id = ?2",
            params![target.to_db_str(), work_order_id],
        )?;
        tracing::info!(work_order_id, from = %current, to = %target, "工单状态流转");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按工单号查询
    pub fn find_by_id(&self, work_order_id: &str) -> RepositoryResult<Option<RemediationPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE work_order_id = ?1", SELECT_BASE))?;
        let mut rows = stmt.query_map(params![work_order_id], Self::map_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 查询活动工单 (OPEN/IN_PROGRESS/BLOCKED, 排序引擎的唯一输入源)
    pub fn list_active(&self) -> RepositoryResult<Vec<RemediationPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status != 'RESOLVED' ORDER BY created_at ASC, work_order_id ASC",
            SELECT_BASE
        ))?;
        let rows = stmt.query_map([], Self::map_row)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?);
        }
        Ok(plans)
    }

    /// 查询全部工单
    pub fn list_all(&self) -> RepositoryResult<Vec<RemediationPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at ASC, work_order_id ASC",
            SELECT_BASE
        ))?;
        let rows = stmt.query_map([], Self::map_row)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?);
        }
        Ok(plans)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RemediationPlan> {
        let anomaly_raw: String = row.get(1)?;
        let severity_raw: String = row.get(3)?;
        let steps_raw: String = row.get(8)?;
        let detected_raw: String = row.get(10)?;
        let deadline_raw: String = row.get(11)?;
        let status_raw: String = row.get(12)?;
        let created_raw: String = row.get(13)?;

        Ok(RemediationPlan {
            work_order_id: row.get(0)?,
            anomaly_type: AnomalyType::from_str(&anomaly_raw)
                .ok_or_else(|| conversion_err(1, &anomaly_raw))?,
            zone_id: row.get(2)?,
            severity: Severity::from_str(&severity_raw)
                .ok_or_else(|| conversion_err(3, &severity_raw))?,
            impact: FinancialImpact {
                waste_kwh_per_hour: row.get(4)?,
                cost_per_hour: row.get(5)?,
                cost_per_day: row.get(6)?,
                cost_per_year: row.get(7)?,
            },
            fix_steps: serde_json::from_str(&steps_raw)
                .map_err(|_| conversion_err(8, &steps_raw))?,
            assigned_team: row.get(9)?,
            detected_at: parse_ts(&detected_raw, 10)?,
            deadline: parse_ts(&deadline_raw, 11)?,
            status: WorkOrderStatus::from_str(&status_raw)
                .ok_or_else(|| conversion_err(12, &status_raw))?,
            created_at: parse_ts(&created_raw, 13)?,
        })
    }
}

/// 查询列顺序 (与 map_row 对齐)
const SELECT_BASE: &str = r#"
    SELECT work_order_id, anomaly_type, zone_id, severity,
           waste_kwh_per_hour, cost_per_hour, cost_per_day, cost_per_year,
           fix_steps_json, assigned_team, detected_at, deadline,
           status, created_at
    FROM work_order
"#;

fn conversion_err(col: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        format!("非法存储值: {}", raw).into(),
    )
}

fn parse_ts(raw: &str, col: usize) -> rusqlite::Result<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|_| conversion_err(col, raw))
}
