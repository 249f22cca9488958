// ==========================================
// 测试数据生成器
// ==========================================
// 用途: 生成带注入异常的遥测 CSV,供集成测试与演示使用
// 用法: cargo run --bin generate_test_data [输出路径]
// ==========================================

use std::fs::File;
use std::io::{BufWriter, Write};

const ZONES: [(&str, f64); 4] = [
    ("ZONE-PAINT-SHOP", 180.0),
    ("ZONE-BODY-SHOP", 140.0),
    ("ZONE-ASSEMBLY", 120.0),
    ("ZONE-BATTERY", 90.0),
];

fn main() -> std::io::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "telemetry_test_data.csv".to_string());

    let file = File::create(&path)?;
    let mut w = BufWriter::new(file);

    writeln!(
        w,
        "timestamp,zone_id,energy_kwh,co2_kg,production_units,compressed_air_m3,temperature_c,shift,status"
    )?;

    // 3 天 × 24 小时 × 4 区域, 确定性伪随机扰动 (线性同余, 不依赖随机库)
    let mut seed: u64 = 42;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) % 1000) as f64 / 1000.0
    };

    for day in 2..5 {
        for hour in 0..24 {
            let shift = match hour {
                6..=13 => "SHIFT-A",
                14..=21 => "SHIFT-B",
                _ => "SHIFT-C",
            };
            let is_work_hour = (6..22).contains(&hour);

            for (zone, base_energy) in ZONES {
                let jitter = next() * 20.0 - 10.0;
                let mut energy = if is_work_hour {
                    base_energy + jitter
                } else {
                    base_energy * 0.2 + jitter.abs()
                };
                let mut units: i64 = if is_work_hour { 8 + (next() * 4.0) as i64 } else { 0 };
                let mut air = if is_work_hour { 25.0 + next() * 10.0 } else { 5.0 };
                let mut temp = 21.0 + next() * 3.0;
                let mut status = if is_work_hour { "OPERATIONAL" } else { "STANDBY" };

                // 注入异常
                // 1) 第 3 天 10 点: 喷漆烘炉空转
                if day == 4 && hour == 10 && zone == "ZONE-PAINT-SHOP" {
                    energy = 220.0;
                    units = 0;
                    status = "OPERATIONAL";
                }
                // 2) 第 3 天 3 点: 总装压缩空气泄漏
                if day == 4 && hour == 3 && zone == "ZONE-ASSEMBLY" {
                    air = 70.0;
                    units = 0;
                }
                // 3) 第 3 天 5 点: 电池车间过度制冷
                if day == 4 && hour == 5 && zone == "ZONE-BATTERY" {
                    temp = 16.5;
                }
                // 4) 第 3 天 2 点: 车身车间待机功耗超标
                if day == 4 && hour == 2 && zone == "ZONE-BODY-SHOP" {
                    energy = 60.0;
                    status = "STANDBY";
                }

                writeln!(
                    w,
                    "2026-03-{:02} {:02}:00:00,{},{:.1},{:.1},{},{:.1},{:.1},{},{}",
                    day,
                    hour,
                    zone,
                    energy,
                    energy * 0.82,
                    units,
                    air,
                    temp,
                    shift,
                    status
                )?;
            }
        }
    }

    w.flush()?;
    println!("测试数据已写入: {}", path);
    Ok(())
}
