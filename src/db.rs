// ==========================================
// 汽车工厂能效决策支持系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 集中建表语句,保证各入口 (CLI/测试) 使用同一 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema (幂等)
///
/// 表:
/// - config_kv: 配置键值 (scope + key 唯一)
/// - zone_reading: 区域小时遥测 (zone_id + timestamp 唯一, 入库后不可变更)
/// - work_order: 整改工单 (work_order_id 唯一, 状态由追踪方流转)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS zone_reading (
            zone_id           TEXT    NOT NULL,
            timestamp         TEXT    NOT NULL,
            energy_kwh        REAL    NOT NULL,
            production_units  INTEGER NOT NULL,
            co2_kg            REAL    NOT NULL,
            temperature_c     REAL,
            compressed_air_m3 REAL    NOT NULL,
            shift             TEXT    NOT NULL,
            status            TEXT    NOT NULL,
            PRIMARY KEY (zone_id, timestamp)
        );
        CREATE INDEX IF NOT EXISTS idx_zone_reading_ts ON zone_reading (timestamp);

        CREATE TABLE IF NOT EXISTS work_order (
            work_order_id TEXT PRIMARY KEY,
            anomaly_type  TEXT NOT NULL,
            zone_id       TEXT NOT NULL,
            severity      TEXT NOT NULL,
            waste_kwh_per_hour REAL NOT NULL,
            cost_per_hour REAL NOT NULL,
            cost_per_day  REAL NOT NULL,
            cost_per_year REAL NOT NULL,
            fix_steps_json TEXT NOT NULL,
            assigned_team TEXT NOT NULL,
            detected_at   TEXT NOT NULL,
            deadline      TEXT NOT NULL,
            status        TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_work_order_status ON work_order (status);
        "#,
    )
}
