//! # 动力学模块
//!
//! 组装并求解刚体运动方程，并把四个子模型合成为 ODE 积分器消费的
//! 单一导数求值入口。
//!
//! ## 运动方程
//!
//! ```text
//! M·θ̈ = τ − Cm·θ̇ − G − f
//!
//! M  = diag(m)            质量矩阵（对角）
//! Cm = diag(I)            转动惯量阻尼项，I = m(2l)²/3
//! G_i = m·g·l·sin(θ_i)    重力回复力矩
//! τ  = [u_1 … u_{N−1}, 0]  关节驱动力矩补零到连杆空间
//! f                        摩擦/接触的广义阻力矩
//! ```
//!
//! 求解 θ̈ 后重构状态导数：
//!
//! ```text
//! φ̈_aug = [ D·θ̈ ; θ̈_N ]          （差分变换，HH 累加的精确逆）
//! p̈     = Σ_i (fx_i, fy_i) / (N·m)  （整链平动的力平衡）
//! ẋ     = [ φ̇_aug | ṗ | φ̈_aug | p̈ ]
//! ```
//!
//! ## 求值流程（每次调用）
//!
//! 1. 校验状态维度，拆分 [φ_aug | p | φ̇_aug | ṗ]
//! 2. 运动学闭合：θ、θ̇、连杆中心位置/速度
//! 3. 摩擦/接触阻力 与 步态控制力矩（两者相互独立）
//! 4. 组装运动方程并求解，重构导数向量
//!
//! 求值是纯函数：相同 (t, x, 配置) 输入逐位复现相同输出；
//! 不持有跨调用状态，不假设 t 单调，可被积分器以任意顺序反复探测。

use nalgebra::{DMatrix, DVector};

use crate::snake::config::SnakeConfig;
use crate::snake::controller::joint_torques;
use crate::snake::error::{NumericalError, SnakeError};
use crate::snake::friction::{resistive_forces, ResistiveForces};
use crate::snake::kinematics::{LinkKinematics, StructuralMatrices};

/// 蛇形机器人动力学模型
///
/// 持有只读配置与按配置预构造的结构矩阵。构造时完成配置校验与
/// 结构矩阵求逆，之后的导数求值不再做任何矩阵构造之外的准备工作。
#[derive(Debug, Clone)]
pub struct SnakeModel {
    config: SnakeConfig,
    structural: StructuralMatrices,
}

impl SnakeModel {
    /// 校验配置并预构造结构矩阵
    pub fn new(config: SnakeConfig) -> Result<Self, SnakeError> {
        config.validate()?;
        let structural = StructuralMatrices::new(config.n)?;
        Ok(Self { config, structural })
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    /// 状态向量长度 2N+4：[φ_aug (N) | p (2) | φ̇_aug (N) | ṗ (2)]
    pub fn state_len(&self) -> usize {
        2 * self.config.n + 4
    }

    /// 导数求值入口：ẋ = f(t, x)
    ///
    /// ## 参数
    /// - `t`: 仿真时间 (s)，允许任意非单调取值
    /// - `x`: 状态向量，长度必须是 2N+4
    ///
    /// ## 返回
    /// 与 x 等长的导数向量；维度不符或数值求解失败时返回错误
    pub fn derivative(&self, t: f32, x: &DVector<f32>) -> Result<DVector<f32>, SnakeError> {
        let n = self.config.n;
        let expected = self.state_len();
        if x.len() != expected {
            return Err(SnakeError::Dimension {
                expected,
                got: x.len(),
            });
        }

        // ===== 1. 拆分状态 =====
        let phi = x.rows(0, n).into_owned();
        let p = [x[n], x[n + 1]];
        let phi_dot = x.rows(n + 2, n).into_owned();
        let p_dot = [x[2 * n + 2], x[2 * n + 3]];

        // ===== 2. 运动学闭合 =====
        let kin = self.structural.solve(self.config.l, &phi, &phi_dot, p, p_dot);

        // ===== 3. 阻力与控制力矩（互不依赖） =====
        let forces = resistive_forces(&self.config, &kin);
        let u = joint_torques(&self.config, t, &phi, &phi_dot);

        // ===== 4. 运动方程求解与导数重构 =====
        let theta_ddot = self.solve_link_accelerations(&kin, &forces, &u)?;

        let mut phi_ddot = DVector::zeros(n);
        phi_ddot
            .rows_mut(0, n - 1)
            .copy_from(&(&self.structural.diff * &theta_ddot));
        phi_ddot[n - 1] = theta_ddot[n - 1];

        let total_mass = n as f32 * self.config.m;
        let p_ddot = [
            forces.fx.sum() / total_mass,
            forces.fy.sum() / total_mass,
        ];

        let mut x_dot = DVector::zeros(expected);
        x_dot.rows_mut(0, n).copy_from(&phi_dot);
        x_dot[n] = p_dot[0];
        x_dot[n + 1] = p_dot[1];
        x_dot.rows_mut(n + 2, n).copy_from(&phi_ddot);
        x_dot[2 * n + 2] = p_ddot[0];
        x_dot[2 * n + 3] = p_ddot[1];

        Ok(x_dot)
    }

    /// 组装 M·θ̈ = τ − Cm·θ̇ − G − f 并求解连杆角加速度
    fn solve_link_accelerations(
        &self,
        kin: &LinkKinematics,
        forces: &ResistiveForces,
        u: &DVector<f32>,
    ) -> Result<DVector<f32>, SnakeError> {
        let n = self.config.n;
        let inertia = self.config.link_inertia();

        let mass_matrix = DMatrix::from_diagonal_element(n, n, self.config.m);

        // 关节力矩补零到连杆空间：尾连杆无直接驱动
        let mut tau = DVector::zeros(n);
        tau.rows_mut(0, n - 1).copy_from(u);

        let gravity = kin
            .theta
            .map(|th| self.config.m * self.config.g * self.config.l * th.sin());

        let rhs = tau - &kin.theta_dot * inertia - gravity - &forces.torque;

        mass_matrix
            .lu()
            .solve(&rhs)
            .ok_or_else(|| NumericalError::MassSolveFailed.into())
    }
}
