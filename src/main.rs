//! # Pipe Snake Simulation
//!
//! 管道内蛇形机器人前向动力学仿真程序。
//!
//! 本程序构造仿真配置与初始状态，用 RK4 积分器驱动动力学求值器
//! 生成整条轨迹，汇报头部推进与关节角包络，并可选地导出 CSV。
//!
//! ## 模块组织
//!
//! - `snake`: 动力学求值框架（配置、运动学闭合、摩擦/接触、控制、积分）
//! - `demos`: 预置仿真场景
//! - `main`: 命令行入口与结果导出

mod demos;
mod snake;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use snake::{simulate, SnakeConfig, SnakeModel, Trajectory};

/// 管道内蛇形机器人前向动力学仿真
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML 配置文件路径（缺省使用文档化的标准场景）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 仿真时长 (s)
    #[arg(long, default_value_t = demos::DEFAULT_DURATION)]
    duration: f32,

    /// 覆盖配置中的积分步长 (s)
    #[arg(long)]
    dt: Option<f32>,

    /// 轨迹 CSV 输出路径
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let (model, x0) = match &args.config {
        Some(path) => {
            let mut config = SnakeConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            if let Some(dt) = args.dt {
                config.dt = dt;
                config.validate()?;
            }
            let x0 = demos::initial_state(config.n);
            (SnakeModel::new(config)?, x0)
        }
        None => {
            let (model, x0) = demos::create_pipeline_scenario()?;
            match args.dt {
                Some(dt) => {
                    let mut config = model.config().clone();
                    config.dt = dt;
                    config.validate()?;
                    (SnakeModel::new(config)?, x0)
                }
                None => (model, x0),
            }
        }
    };

    let dt = model.config().dt;
    info!(
        n = model.config().n,
        dt,
        duration = args.duration,
        "starting simulation"
    );

    let trajectory = simulate(&model, x0, 0.0, args.duration, dt)?;
    report(&model, &trajectory);

    if let Some(path) = &args.output {
        write_csv(&model, &trajectory, path)
            .with_context(|| format!("writing trajectory to {}", path.display()))?;
        info!(path = %path.display(), rows = trajectory.len(), "trajectory written");
    }

    Ok(())
}

/// 打印仿真结果摘要
fn report(model: &SnakeModel, trajectory: &Trajectory) {
    let n = model.config().n;
    let first = trajectory.head_position(0);
    let last = trajectory.head_position(trajectory.len() - 1);

    let mut max_joint: f32 = 0.0;
    for state in &trajectory.states {
        for i in 0..n - 1 {
            max_joint = max_joint.max(state[i].abs());
        }
    }

    println!("=== 仿真结果 ===");
    println!(
        "时间范围: {:.2} s – {:.2} s ({} 个采样)",
        trajectory.times[0],
        trajectory.times[trajectory.len() - 1],
        trajectory.len()
    );
    println!(
        "头部位移: Δx = {:+.4} m, Δy = {:+.4} m",
        last[0] - first[0],
        last[1] - first[1]
    );
    println!(
        "关节角峰值: {:.4} rad (参考幅值 {:.4} rad)",
        max_joint,
        model.config().alpha_a
    );
    println!("================");
}

/// 把轨迹导出为 CSV：t, p_x, p_y, phi_1..phi_{N-1}, theta_N
fn write_csv(
    model: &SnakeModel,
    trajectory: &Trajectory,
    path: &std::path::Path,
) -> std::io::Result<()> {
    let n = model.config().n;
    let mut out = BufWriter::new(File::create(path)?);

    write!(out, "t,p_x,p_y")?;
    for i in 1..n {
        write!(out, ",phi_{i}")?;
    }
    writeln!(out, ",theta_n")?;

    for (i, state) in trajectory.states.iter().enumerate() {
        write!(
            out,
            "{},{},{}",
            trajectory.times[i],
            state[n],
            state[n + 1]
        )?;
        for j in 0..n {
            write!(out, ",{}", state[j])?;
        }
        writeln!(out)?;
    }
    out.flush()
}
