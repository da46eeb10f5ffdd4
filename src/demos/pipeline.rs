//! # 管道场景
//!
//! 文档化的标准仿真场景：14 连杆蛇形机器人在直径 0.30 m 的管道内，
//! 粘性摩擦、管壁接触开启，从零初始状态出发由步态控制器驱动。
//!
//! ## 物理参数
//!
//! - 连杆: 14 节，单节质量 0.406 kg，半长 0.0525 m
//! - 管道: 直径 0.30 m，影响常数 0.10 m
//! - 控制: kp = 25，kd = 10，参考幅值 0.3981 rad，角频率 0.6936 rad/s
//! - 积分: 步长 0.01 s

use nalgebra::DVector;

use crate::snake::{SnakeConfig, SnakeError, SnakeModel};

/// 标准场景的仿真时长 (s)
pub const DEFAULT_DURATION: f32 = 20.0;

/// 零初始状态：关节角/角速度、头部位置/速度全为零
pub fn initial_state(n: usize) -> DVector<f32> {
    DVector::zeros(2 * n + 4)
}

/// 构造标准管道场景
///
/// ## 返回值
/// - `(model, x0)`: 校验过的动力学模型和零初始状态
pub fn create_pipeline_scenario() -> Result<(SnakeModel, DVector<f32>), SnakeError> {
    let config = SnakeConfig::default();

    println!("=== 管道蛇形机器人场景 ===");
    println!("连杆数量: {}", config.n);
    println!("连杆质量: {:.3} kg, 半长: {:.4} m", config.m, config.l);
    println!(
        "管道直径: {:.2} m (自由管径 {:.3} m)",
        config.diameter,
        config.free_diameter()
    );
    println!(
        "步态参考: α = {:.4} rad, ω = {:.4} rad/s, δ = {:.4} rad",
        config.alpha_a, config.omega, config.delta
    );
    println!("==========================\n");

    let x0 = initial_state(config.n);
    let model = SnakeModel::new(config)?;
    Ok((model, x0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::simulate;

    #[test]
    fn scenario_dimensions_are_consistent() {
        let (model, x0) = create_pipeline_scenario().unwrap();
        assert_eq!(model.config().n, 14);
        assert_eq!(model.state_len(), 32);
        assert_eq!(x0.len(), model.state_len());
        assert_eq!(x0.iter().map(|v| v.abs()).sum::<f32>(), 0.0);
    }

    /// 完整场景：0–20 s，步长 0.01 s
    ///
    /// 步态驱动下头部应当沿管道轴向持续推进（粗检查点之间的位移
    /// 同号且净位移非零），关节角保持在参考幅值附近的包络内。
    #[test]
    fn full_run_progresses_along_pipe_axis() {
        let (model, x0) = create_pipeline_scenario().unwrap();
        let dt = model.config().dt;
        let traj = simulate(&model, x0, 0.0, DEFAULT_DURATION, dt).unwrap();
        assert_eq!(traj.len(), 2001);

        // 全程数值有界
        for state in &traj.states {
            assert!(state.iter().all(|v| v.is_finite()));
        }

        // 跳过初始瞬态，按一个步态周期 (2π/ω ≈ 9.06 s) 取检查点，
        // 周期对齐让头部位置中的振荡分量相消，只留下净推进
        let p0 = traj.head_position(188)[0]; //  1.88 s
        let p1 = traj.head_position(1094)[0]; // + 一个周期
        let p2 = traj.head_position(2000)[0]; // + 两个周期
        let d1 = p1 - p0;
        let d2 = p2 - p1;
        assert!(
            d1 * d2 > 0.0,
            "axial drift must keep its direction: d1 = {d1}, d2 = {d2}"
        );
        assert!(
            (p2 - p0).abs() > 1e-3,
            "net axial displacement too small: {}",
            p2 - p0
        );

        // 关节角停留在参考幅值包络内（给跟踪瞬态留 25% 裕度）
        let n = model.config().n;
        let bound = 1.25 * model.config().alpha_a + model.config().offset.abs();
        for state in &traj.states {
            for i in 0..n - 1 {
                assert!(
                    state[i].abs() <= bound,
                    "joint angle {} exceeds envelope {}",
                    state[i],
                    bound
                );
            }
        }
    }
}
