// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 默认值回退 / 覆写生效 / JSON 配置资产解析
// ==========================================

use plant_greenops::config::{ConfigManager, EngineConfigReader, RemediationPlaybook};
use plant_greenops::db::{configure_sqlite_connection, init_schema};
use plant_greenops::domain::types::{AnomalyType, Severity};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// 测试辅助函数
// ==========================================

fn create_manager() -> ConfigManager {
    let conn = Connection::open_in_memory().unwrap();
    configure_sqlite_connection(&conn).unwrap();
    init_schema(&conn).unwrap();
    ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
}

#[tokio::test]
async fn test_defaults_when_table_empty() {
    let manager = create_manager();

    let detection = manager.get_detection_config().await.unwrap();
    assert_eq!(detection.paint_zone_marker, "PAINT");
    assert_eq!(detection.paint_idle_energy_kwh, 150.0);
    assert_eq!(detection.scoring_timeout_ms, 3_000);

    let planner = manager.get_planner_config().await.unwrap();
    assert_eq!(planner.unit_cost_per_kwh, 0.07);
    assert_eq!(planner.deadline.high_hours, 2);
    assert_eq!(planner.deadline.medium_hours, 24);
    assert_eq!(planner.deadline.low_hours, 72);

    assert_eq!(manager.get_fusion_score_threshold().await.unwrap(), 0.5);
}

#[tokio::test]
async fn test_overrides_take_effect() {
    let manager = create_manager();

    manager.upsert_config_value("paint_idle_energy_kwh", "210.5").unwrap();
    manager.upsert_config_value("fusion_score_threshold", "0.72").unwrap();
    manager.upsert_config_value("deadline_hours_high", "4").unwrap();
    manager
        .upsert_config_value("zone_area_m2", r#"{"ZONE-HVAC-EAST": 850.0}"#)
        .unwrap();

    let detection = manager.get_detection_config().await.unwrap();
    assert_eq!(detection.paint_idle_energy_kwh, 210.5);
    assert_eq!(detection.zone_area_m2["ZONE-HVAC-EAST"], 850.0);

    let planner = manager.get_planner_config().await.unwrap();
    assert_eq!(planner.deadline.high_hours, 4);

    assert_eq!(manager.get_fusion_score_threshold().await.unwrap(), 0.72);
}

#[tokio::test]
async fn test_malformed_value_falls_back_to_default() {
    let manager = create_manager();
    manager.upsert_config_value("air_leak_m3", "not-a-number").unwrap();
    manager.upsert_config_value("zone_area_m2", "{broken json").unwrap();

    let detection = manager.get_detection_config().await.unwrap();
    // 格式错误回退默认,检测链路不因配置问题瘫痪
    assert_eq!(detection.air_leak_m3, 50.0);
    assert!(detection.zone_area_m2.is_empty());
}

#[tokio::test]
async fn test_playbook_from_config_asset() {
    let manager = create_manager();

    // 默认: 内置手册覆盖全部类型
    let default_playbook = manager.get_playbook().await.unwrap();
    assert!(default_playbook.lookup(AnomalyType::ModelDetected).is_some());

    // 覆写: 精简手册作为配置资产下发 (数据变更,不是代码变更)
    let mut entries = std::collections::HashMap::new();
    entries.insert(
        AnomalyType::PaintOvenIdle,
        plant_greenops::config::PlaybookEntry {
            fix_steps: vec!["自定义步骤".to_string()],
            assigned_team: "定制班组".to_string(),
            severity_base: Severity::Low,
        },
    );
    let custom = RemediationPlaybook::from_entries(entries);
    manager
        .upsert_config_value(
            "remediation_playbook",
            &serde_json::to_string(&custom).unwrap(),
        )
        .unwrap();

    let loaded = manager.get_playbook().await.unwrap();
    assert_eq!(loaded.len(), 1);
    let entry = loaded.lookup(AnomalyType::PaintOvenIdle).unwrap();
    assert_eq!(entry.assigned_team, "定制班组");
    assert_eq!(entry.severity_base, Severity::Low);
    // 精简后未覆盖的类型无映射 (规划侧将硬失败并上报)
    assert!(loaded.lookup(AnomalyType::CompressedAirLeak).is_none());
}

#[tokio::test]
async fn test_broken_playbook_json_falls_back_to_builtin() {
    let manager = create_manager();
    manager
        .upsert_config_value("remediation_playbook", "{not valid json")
        .unwrap();

    let playbook = manager.get_playbook().await.unwrap();
    assert!(playbook.lookup(AnomalyType::PaintOvenIdle).is_some());
    assert!(playbook.len() >= 7);
}
