//! # 步态控制模块
//!
//! PD 控制器跟踪逐关节相移的正弦参考轨迹：
//!
//! ```text
//! ref_i(t)  = α·sin(ω·t + i·δ) + offset
//! ref'_i(t) = α·ω·cos(ω·t + i·δ)
//! u_i       = kp·(ref_i − φ_i) + kd·(ref'_i − φ̇_i)
//! ```
//!
//! 相位差 δ 让参考信号沿身体形成行波。控制器本身不区分运动步态——
//! 它只跟踪这一个时间参数化的相位信号，不同的宏观运动形态由消费端
//! 对同一信号的使用方式决定。
//!
//! 输出力矩按配置的驱动上限饱和（clamp 到 ±umax），与执行器的物理
//! 限制一致。

use nalgebra::DVector;

use crate::snake::config::SnakeConfig;

/// 关节 i 在时刻 t 的参考角 (rad)
#[inline]
pub fn reference_angle(config: &SnakeConfig, t: f32, i: usize) -> f32 {
    config.alpha_a * (config.omega * t + i as f32 * config.delta).sin() + config.offset
}

/// 关节 i 在时刻 t 的参考角速度 (rad/s)，参考角的解析导数
#[inline]
pub fn reference_rate(config: &SnakeConfig, t: f32, i: usize) -> f32 {
    config.alpha_a * config.omega * (config.omega * t + i as f32 * config.delta).cos()
}

/// 计算 N−1 个关节的驱动力矩 (N·m)
///
/// `phi` / `phi_dot` 传入增广向量（长度 N），前 N−1 个分量是关节角，
/// 末位的尾连杆朝向不受直接驱动。
pub fn joint_torques(
    config: &SnakeConfig,
    t: f32,
    phi: &DVector<f32>,
    phi_dot: &DVector<f32>,
) -> DVector<f32> {
    let joints = config.n - 1;
    DVector::from_fn(joints, |i, _| {
        let u = config.kp * (reference_angle(config, t, i) - phi[i])
            + config.kd * (reference_rate(config, t, i) - phi_dot[i]);
        u.clamp(-config.umax, config.umax)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn torque_vanishes_on_reference_trajectory() {
        // φ 与 φ̇ 精确位于参考轨迹上时，PD 输出为零
        let config = SnakeConfig::default();
        let n = config.n;
        let t = 3.7;

        let mut phi = DVector::zeros(n);
        let mut phi_dot = DVector::zeros(n);
        for i in 0..n - 1 {
            phi[i] = reference_angle(&config, t, i);
            phi_dot[i] = reference_rate(&config, t, i);
        }

        let u = joint_torques(&config, t, &phi, &phi_dot);
        assert_eq!(u.len(), n - 1);
        for i in 0..n - 1 {
            assert_relative_eq!(u[i], 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn zero_gains_give_zero_torque() {
        let config = SnakeConfig {
            kp: 0.0,
            kd: 0.0,
            ..SnakeConfig::default()
        };
        let phi = DVector::from_element(config.n, 0.5);
        let phi_dot = DVector::from_element(config.n, -0.2);
        let u = joint_torques(&config, 1.0, &phi, &phi_dot);
        assert_eq!(u.sum(), 0.0);
    }

    #[test]
    fn torque_saturates_at_umax() {
        let config = SnakeConfig {
            kp: 1000.0,
            ..SnakeConfig::default()
        };
        // 大误差下输出被钳制在 ±umax
        let phi = DVector::from_element(config.n, -2.0);
        let phi_dot = DVector::zeros(config.n);
        let u = joint_torques(&config, 0.0, &phi, &phi_dot);
        for i in 0..config.n - 1 {
            assert!(u[i].abs() <= config.umax);
        }
        assert_relative_eq!(u[0], config.umax, epsilon = 1e-6);
    }

    #[test]
    fn phase_offset_shifts_reference_along_body() {
        let config = SnakeConfig::default();
        let t = 0.0;
        // i·δ 的相移：关节 i 在 t=0 的参考角等于关节 0 在 t=i·δ/ω 的参考角
        for i in 1..5 {
            let shifted_t = i as f32 * config.delta / config.omega;
            assert_relative_eq!(
                reference_angle(&config, t, i),
                reference_angle(&config, shifted_t, 0),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn offset_steers_reference_mean() {
        let config = SnakeConfig {
            offset: 0.1,
            ..SnakeConfig::default()
        };
        // 偏置常数整体抬高参考角，不影响参考角速度
        let base = SnakeConfig::default();
        assert_relative_eq!(
            reference_angle(&config, 2.0, 3) - reference_angle(&base, 2.0, 3),
            0.1,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            reference_rate(&config, 2.0, 3),
            reference_rate(&base, 2.0, 3),
            epsilon = 1e-6
        );
    }
}
