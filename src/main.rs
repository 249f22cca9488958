// ==========================================
// 汽车工厂能效决策支持系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (人工最终控制权)
// 用法:
//   plant-greenops import <telemetry.csv>   导入遥测数据
//   plant-greenops report                   运行检测链路并输出报告
//   plant-greenops forecast <hours>         递推预测未来电耗
//   plant-greenops rank [top_n]             按优先级列出活动工单
// ==========================================

use plant_greenops::app::{get_default_db_path, AppState};
use plant_greenops::domain::ReadingFilter;
use plant_greenops::i18n::{t, t_with_args};

#[tokio::main]
async fn main() {
    // 初始化日志系统
    plant_greenops::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", plant_greenops::APP_NAME);
    tracing::info!("系统版本: {}", plant_greenops::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(&db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();
    let exit_code = match args.get(1).map(String::as_str) {
        Some("import") => cmd_import(&state, args.get(2).map(String::as_str)),
        Some("report") => cmd_report(&state).await,
        Some("forecast") => cmd_forecast(&state, args.get(2).map(String::as_str)).await,
        Some("rank") => cmd_rank(&state, args.get(2).map(String::as_str)),
        _ => {
            print_usage();
            0
        }
    };

    std::process::exit(exit_code);
}

fn print_usage() {
    println!("{} v{}", plant_greenops::APP_NAME, plant_greenops::VERSION);
    println!();
    println!("用法:");
    println!("  plant-greenops import <telemetry.csv>   导入遥测数据");
    println!("  plant-greenops report                   运行检测链路并输出报告");
    println!("  plant-greenops forecast <hours>         递推预测未来电耗 (1..=168)");
    println!("  plant-greenops rank [top_n]             按优先级列出活动工单");
}

/// 导入遥测 CSV
fn cmd_import(state: &AppState, path: Option<&str>) -> i32 {
    let path = match path {
        Some(p) => p,
        None => {
            eprintln!("缺少参数: CSV 文件路径");
            return 2;
        }
    };

    match state.importer.import_from_csv(path) {
        Ok(result) => {
            println!(
                "导入完成: 批次 {} | 总行数 {} | 入库 {} | 跳过 {}",
                result.batch_id, result.total_rows, result.imported, result.skipped
            );
            for v in &result.violations {
                println!("  第 {} 行 [{}]: {}", v.row, v.field, v.reason);
            }
            0
        }
        Err(e) => {
            tracing::error!("导入失败: {}", e);
            1
        }
    }
}

/// 运行检测链路并输出报告
async fn cmd_report(state: &AppState) -> i32 {
    let now_utc = chrono::Utc::now().naive_utc();
    let report = match state
        .detection_api
        .run_pipeline(&ReadingFilter::default(), now_utc)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("检测链路失败: {}", e);
            return 1;
        }
    };

    println!("=== {} ===", plant_greenops::APP_NAME);
    println!(
        "总电耗 {:.1} kWh | 总碳排 {:.1} kg | 总产量 {} 台",
        report.kpis.total_energy_kwh, report.kpis.total_co2_kg, report.kpis.total_units
    );
    if let Some(epu) = report.kpis.energy_per_unit_kwh {
        println!("单位能耗 {:.1} kWh/台", epu);
    }
    for share in &report.kpis.zone_energy {
        println!(
            "  {} {:.1} kWh ({:.1}%)",
            share.zone_id, share.energy_kwh, share.share_pct
        );
    }

    println!();
    println!("{}", t("report.anomalies_header"));
    if report.detection.fusion.records.is_empty() {
        println!("  {}", t("report.none"));
    }
    for record in &report.detection.fusion.records {
        println!(
            "  [{}] {} @ {} ({}) — {}",
            record.source, record.anomaly_type, record.zone_id, record.timestamp, record.note
        );
    }
    if report.detection.skipped_count > 0 {
        println!(
            "  {}",
            t_with_args(
                "report.skipped",
                &[("count", &report.detection.skipped_count.to_string())]
            )
        );
    }

    println!();
    println!("{}", t("report.actions_header"));
    match state.work_order_api.list_ranked(None, None) {
        Ok(entries) => {
            if entries.is_empty() {
                println!("  {}", t("report.none"));
            }
            for entry in entries {
                println!(
                    "  [{}] {} {} 年化损失 {:.0} (加权 {:.0}) 期限 {}",
                    entry.plan.severity,
                    entry.plan.work_order_id,
                    entry.plan.zone_id,
                    entry.plan.impact.cost_per_year,
                    entry.priority_score,
                    entry.plan.deadline.format("%m-%d %H:%M"),
                );
            }
        }
        Err(e) => {
            tracing::error!("工单排序失败: {}", e);
            return 1;
        }
    }

    for failure in &report.planning.failures {
        println!("  规划失败 [{}]: {}", failure.anomaly_type, failure.reason);
    }
    0
}

/// 递推预测
async fn cmd_forecast(state: &AppState, hours: Option<&str>) -> i32 {
    let horizon: u32 = match hours.and_then(|h| h.parse().ok()) {
        Some(h) => h,
        None => {
            eprintln!("缺少参数: 预测小时数 (1..=168)");
            return 2;
        }
    };

    match state
        .forecast_api
        .forecast_energy(None, None, None, horizon)
        .await
    {
        Ok(report) => {
            println!(
                "未来 {} 小时预测: 合计 {:.1} kWh, 均值 {:.1} kWh/h{}",
                horizon,
                report.total_predicted_kwh,
                report.average_per_hour_kwh,
                if report.degraded {
                    " (历史不足 24 小时, 精度降级)"
                } else {
                    ""
                }
            );
            for point in &report.points {
                println!(
                    "  +{:>3}h {} {:.1} kWh",
                    point.hour_offset,
                    point.timestamp.format("%m-%d %H:%M"),
                    point.predicted_energy_kwh
                );
            }
            0
        }
        Err(e) => {
            tracing::error!("预测失败: {}", e);
            1
        }
    }
}

/// 工单优先级列表
fn cmd_rank(state: &AppState, top_n: Option<&str>) -> i32 {
    let limit = top_n.and_then(|n| n.parse::<usize>().ok());
    match state.work_order_api.list_ranked(limit, None) {
        Ok(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>2}. [{}] {} {} {} 加权 {:.0}",
                    i + 1,
                    entry.plan.severity,
                    entry.plan.work_order_id,
                    entry.plan.anomaly_type,
                    entry.plan.zone_id,
                    entry.priority_score,
                );
            }
            0
        }
        Err(e) => {
            tracing::error!("工单排序失败: {}", e);
            1
        }
    }
}
