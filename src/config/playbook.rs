// ==========================================
// 汽车工厂能效决策支持系统 - 整改手册
// ==========================================
// 职责: 异常类型 → 处置方案的数据驱动映射
// 红线: 映射是配置资产而非分支代码,新增异常/处置配对
//       是数据变更,不是代码变更
// 存储: config_kv 表 remediation_playbook 键 (JSON), 缺省时用内置手册
// ==========================================

use crate::domain::types::{AnomalyType, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// PlaybookEntry - 单类异常的处置方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookEntry {
    pub fix_steps: Vec<String>,   // 处置步骤 (有序)
    pub assigned_team: String,    // 责任班组
    pub severity_base: Severity,  // 基础严重度 (财务影响可再升一级)
}

// ==========================================
// RemediationPlaybook - 整改手册
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlaybook {
    entries: HashMap<AnomalyType, PlaybookEntry>,
}

impl RemediationPlaybook {
    /// 查找异常类型的处置方案
    ///
    /// # 返回
    /// - Some(entry): 有映射
    /// - None: 无映射 (调用方必须硬失败,不得编造通用方案)
    pub fn lookup(&self, anomaly_type: AnomalyType) -> Option<&PlaybookEntry> {
        self.entries.get(&anomaly_type)
    }

    /// 手册条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 手册是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 从 JSON 配置解析手册
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 自定义条目构造 (测试与配置覆写用)
    pub fn from_entries(entries: HashMap<AnomalyType, PlaybookEntry>) -> Self {
        Self { entries }
    }
}

impl Default for RemediationPlaybook {
    /// 内置手册: 覆盖全部已知异常类型
    fn default() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            AnomalyType::PaintOvenIdle,
            PlaybookEntry {
                fix_steps: vec![
                    "检查烘炉定时器设置".to_string(),
                    "核实生产间隙自动停炉逻辑".to_string(),
                    "按生产排程联调定时器".to_string(),
                    "在维护台账记录定时器配置".to_string(),
                ],
                assigned_team: "维修班组".to_string(),
                severity_base: Severity::High,
            },
        );

        entries.insert(
            AnomalyType::CompressedAirLeak,
            PlaybookEntry {
                fix_steps: vec![
                    "用超声检漏仪定位泄漏点".to_string(),
                    "隔离受影响的区域/设备".to_string(),
                    "更换损坏的密封件或阀门".to_string(),
                    "修复后做保压测试".to_string(),
                    "修复后持续监测 24 小时".to_string(),
                ],
                assigned_team: "维修班组".to_string(),
                severity_base: Severity::High,
            },
        );

        entries.insert(
            AnomalyType::HvacOvercooling,
            PlaybookEntry {
                fix_steps: vec![
                    "复核并上调温度设定点".to_string(),
                    "校验区域温度传感器".to_string(),
                    "排查漏风与保温缺口".to_string(),
                    "按生产时段优化空调排程".to_string(),
                ],
                assigned_team: "设施班组".to_string(),
                severity_base: Severity::Medium,
            },
        );

        entries.insert(
            AnomalyType::HvacInefficiency,
            PlaybookEntry {
                fix_steps: vec![
                    "核对空调机组运行参数".to_string(),
                    "检查过滤网与换热器结垢".to_string(),
                    "核算单位面积能耗并与同类区域对标".to_string(),
                    "必要时安排机组保养".to_string(),
                ],
                assigned_team: "设施班组".to_string(),
                severity_base: Severity::Medium,
            },
        );

        entries.insert(
            AnomalyType::StandbyPowerExcessive,
            PlaybookEntry {
                fix_steps: vec![
                    "排查待机状态下仍运行的设备".to_string(),
                    "建立/更新停机检查清单".to_string(),
                    "培训操作人员执行停机流程".to_string(),
                    "部署自动停机定时器".to_string(),
                ],
                assigned_team: "运行班组".to_string(),
                severity_base: Severity::Low,
            },
        );

        entries.insert(
            AnomalyType::ProductionEfficiencyDrop,
            PlaybookEntry {
                fix_steps: vec![
                    "分析生产数据识别劣化模式".to_string(),
                    "检查设备参数与标定漂移".to_string(),
                    "复核来料批次质量".to_string(),
                    "安排预防性维护".to_string(),
                    "必要时补充操作培训".to_string(),
                ],
                assigned_team: "生产与维修班组".to_string(),
                severity_base: Severity::Medium,
            },
        );

        entries.insert(
            AnomalyType::ModelDetected,
            PlaybookEntry {
                fix_steps: vec![
                    "调取命中时段的全量遥测复核".to_string(),
                    "比对同区域历史同时段基线".to_string(),
                    "现场巡检确认设备状态".to_string(),
                    "确认后转入对应专项处置流程".to_string(),
                ],
                assigned_team: "能效分析组".to_string(),
                severity_base: Severity::Low,
            },
        );

        Self { entries }
    }
}
