//! # 摩擦与管壁接触模块
//!
//! 由连杆中心速度/位置计算每个连杆受到的阻力，输出全局坐标系下的
//! 力分量以及进入运动方程的广义阻力矩。
//!
//! ## 模型
//!
//! 地面摩擦在连杆坐标系（切向/法向）中计算，两种模型互斥：
//!
//! - **粘性**: F_t = −ct·v_t，F_n = −cn·v_n
//! - **库仑**: F_t = −ut·m·g·sgn(v_t)，F_n = −un·m·g·sgn(v_n)
//!
//! 库仑模型的符号函数在零速度处不连续，会诱发刚性振荡，
//! 这里用最小速度阈值替代：sgn(v) ≈ v / max(|v|, min_link_vel)。
//!
//! 管壁接触开启时，连杆中心侧向位置超出有效管壁半径即施加指向管轴的
//! Hertz 型法向力（由等效弹性模量与泊松比参数化，幅值饱和于 qmax），
//! 并叠加接触期间的管壁切向摩擦。接触关闭时管壁力恒为零。

use nalgebra::DVector;

use crate::snake::config::{ContactMode, FrictionMode, SnakeConfig};
use crate::snake::kinematics::LinkKinematics;

/// 每个连杆的阻力合成结果
#[derive(Debug, Clone)]
pub struct ResistiveForces {
    /// 全局 x 方向合力 (N)
    pub fx: DVector<f32>,
    /// 全局 y 方向合力 (N)
    pub fy: DVector<f32>,
    /// 广义阻力矩（长度 N），以负号进入运动方程
    pub torque: DVector<f32>,
}

/// 平滑符号函数：用速度阈值替代零速度处的不连续
#[inline]
fn sign_smoothed(v: f32, min_vel: f32) -> f32 {
    v / v.abs().max(min_vel)
}

/// 计算全部连杆的阻力
pub fn resistive_forces(config: &SnakeConfig, kin: &LinkKinematics) -> ResistiveForces {
    let n = config.n;
    let wall_radius = config.wall_radius();
    // Hertz 接触等效模量 E* = E/(1−ν²)
    let e_eff = config.erub / (1.0 - config.vrub * config.vrub);

    let mut fx = DVector::zeros(n);
    let mut fy = DVector::zeros(n);
    let mut torque = DVector::zeros(n);

    for i in 0..n {
        let c = kin.theta[i].cos();
        let s = kin.theta[i].sin();

        // 中心速度在连杆坐标系中的分解
        let v_t = c * kin.xc_dot[i] + s * kin.yc_dot[i];
        let v_n = -s * kin.xc_dot[i] + c * kin.yc_dot[i];

        // ===== 地面摩擦 =====
        let (mut f_t, f_n) = match config.friction {
            FrictionMode::Viscous => (-config.ct * v_t, -config.cn * v_n),
            FrictionMode::Coulomb => {
                let load = config.m * config.g;
                (
                    -config.ut * load * sign_smoothed(v_t, config.min_link_vel),
                    -config.un * load * sign_smoothed(v_n, config.min_link_vel),
                )
            }
        };

        // ===== 管壁接触 =====
        let mut wall_fy = 0.0;
        if config.contact == ContactMode::On {
            let lateral = kin.yc[i];
            let penetration = lateral.abs() - wall_radius;
            if penetration > 0.0 {
                // Hertz 型法向力，幅值饱和于 qmax
                let magnitude =
                    (4.0 / 3.0 * e_eff * config.l.sqrt() * penetration.powf(1.5)).min(config.qmax);
                wall_fy = -lateral.signum() * magnitude;

                // 接触期间的管壁切向摩擦
                f_t += match config.friction {
                    FrictionMode::Viscous => -config.ct_pipe * v_t,
                    FrictionMode::Coulomb => {
                        -config.ut_pipe * magnitude * sign_smoothed(v_t, config.min_link_vel)
                    }
                };
            }
        }

        // 连杆系力旋转回全局系，管壁法向力沿全局 y
        fx[i] = c * f_t - s * f_n;
        fy[i] = s * f_t + c * f_n + wall_fy;

        // 合力作用于连杆中心，对连杆参考端点的力矩臂为 l·(cosθ, sinθ)。
        // 取阻力矩约定（进入运动方程时带负号），故整体再取反。
        torque[i] = -config.l * (c * fy[i] - s * fx[i]);
    }

    ResistiveForces { fx, fy, torque }
}
