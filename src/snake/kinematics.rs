//! # 运动学闭合模块
//!
//! 从相对关节角恢复连杆链的绝对姿态与连杆中心位置/速度。
//!
//! ## 核心概念
//!
//! - **相对关节角 φ**: 相邻连杆之间的角度差，是被控制的自由度
//! - **绝对朝向 θ**: 连杆在世界系中的朝向，θ = HH·φ_aug（从尾部累加）
//! - **浮动基座**: 关节角未覆盖的头部位置自由度 p = [p_x, p_y]
//! - **闭合约束**: 相邻连杆端点重合 + 链的参考点等于 p
//!
//! ## 算法参考
//!
//! 约束方程组 H·X = rhs 中 H 由端点差分算子 J 和参考点约束行 (1/N)eᵀ
//! 叠成。直接求逆在病态情形下不可靠，这里按块矩阵 Schur 补方式构造
//! H⁻¹ = Hᵀ(HHᵀ)⁻¹：先求 A = JJᵀ 的逆，再求 Schur 补的逆，最后组合成
//! 四个子块。该做法与 Liljebäck 等人蛇形机器人模型中的冗余消解伪逆
//! 一致。结构矩阵只依赖连杆数量 N，每个配置构造一次，逐次求值复用。

use nalgebra::{DMatrix, DVector};

use crate::snake::error::{NumericalError, SnakeError};

// ---------------------------------------------------------------------------
// 结构矩阵
// ---------------------------------------------------------------------------

/// 运动学闭合所需的结构常量
///
/// 只依赖连杆数量 N，与演化状态无关，随模型构造一次后只读。
#[derive(Debug, Clone)]
pub struct StructuralMatrices {
    /// 连杆数量
    pub n: usize,
    /// 后向差分算子 ((N−1)×N)：(D·θ)_i = θ_i − θ_{i+1} = φ_i
    pub diff: DMatrix<f32>,
    /// 上三角全 1 累加算子 (N×N)：θ = HH·φ_aug
    pub hh: DMatrix<f32>,
    /// 端点前向差分算子 (N×(N+1))：(J·X)_i = X_{i+1} − X_i
    pub jj: DMatrix<f32>,
    /// 端点选择算子 (N×(N+1))：取前 N 个端点
    pub kk: DMatrix<f32>,
    /// 参考点约束行权重（长度 N+1，前 N 个为 1，末位为 0）
    pub e: DVector<f32>,
    /// 全 1 向量（长度 N）
    pub k: DVector<f32>,
    /// 闭合约束矩阵的伪逆 Hinv = Hᵀ(HHᵀ)⁻¹ ((N+1)×(N+1))
    pub hinv: DMatrix<f32>,
}

impl StructuralMatrices {
    /// 按连杆数量 N 构造全部结构常量
    ///
    /// ## 构造流程
    ///
    /// 1. 差分/累加算子 D、HH 与端点算子 J、K
    /// 2. HHᵀ 的四个子块:
    ///    ```text
    ///    A = J·Jᵀ          (N×N, 三对角 [−1, 2, −1])
    ///    B = (1/N)·J·e     (N×1)
    ///    C = Bᵀ            (1×N)
    ///    Dblk = (1/N)·eᵀe/N = 1/N
    ///    ```
    /// 3. Schur 补求逆并组合:
    ///    ```text
    ///    DD = (Dblk − C·A⁻¹·B)⁻¹
    ///    AA = A⁻¹ + A⁻¹·B·DD·C·A⁻¹
    ///    BB = −A⁻¹·B·DD
    ///    CC = −DD·C·A⁻¹
    ///    Hinv = [Jᵀ | (1/N)e] · [[AA, BB], [CC, DD]]
    ///    ```
    ///
    /// ## 失败
    ///
    /// A 或 Schur 补奇异（对合法的 N ≥ 2 不会发生，但一旦发生必须上报
    /// 而不是静默产生 NaN）。N < 2 时差分算子退化，由配置校验提前拒绝。
    pub fn new(n: usize) -> Result<Self, SnakeError> {
        debug_assert!(n >= 2);
        let nf = n as f32;

        let diff = DMatrix::from_fn(n - 1, n, |i, j| {
            if j == i {
                1.0
            } else if j == i + 1 {
                -1.0
            } else {
                0.0
            }
        });
        let hh = DMatrix::from_fn(n, n, |i, j| if j >= i { 1.0 } else { 0.0 });
        let jj = DMatrix::from_fn(n, n + 1, |i, j| {
            if j == i {
                -1.0
            } else if j == i + 1 {
                1.0
            } else {
                0.0
            }
        });
        let kk = DMatrix::identity(n, n + 1);
        let e = DVector::from_fn(n + 1, |i, _| if i < n { 1.0 } else { 0.0 });
        let k = DVector::repeat(n, 1.0);

        // ===== HHᵀ 的子块 =====
        let a = &jj * jj.transpose();
        let a_inv = a
            .clone()
            .try_inverse()
            .ok_or(NumericalError::SingularMatrix { name: "A = J*J^T" })?;
        let b = (&jj * &e) / nf;
        let c = b.transpose();
        let d_blk = 1.0 / nf;

        // ===== Schur 补求逆 =====
        let a_inv_b = &a_inv * &b;
        let schur = d_blk - b.dot(&a_inv_b);
        if schur.abs() <= f32::EPSILON {
            return Err(NumericalError::SingularMatrix {
                name: "Schur complement",
            }
            .into());
        }
        let dd = 1.0 / schur;

        let c_a_inv = &c * &a_inv;
        let aa = &a_inv + (&a_inv_b * dd) * &c_a_inv;
        let bb = -(&a_inv_b * dd);
        let cc = -(&c_a_inv * dd);

        // ===== 组合 Hinv = [Jᵀ | (1/N)e] · [[AA, BB], [CC, DD]] =====
        let mut right = DMatrix::zeros(n + 1, n + 1);
        right.view_mut((0, 0), (n, n)).copy_from(&aa);
        right.view_mut((0, n), (n, 1)).copy_from(&bb);
        right.view_mut((n, 0), (1, n)).copy_from(&cc);
        right[(n, n)] = dd;

        let mut left = DMatrix::zeros(n + 1, n + 1);
        left.view_mut((0, 0), (n + 1, n)).copy_from(&jj.transpose());
        left.view_mut((0, n), (n + 1, 1)).copy_from(&(&e / nf));

        let hinv = left * right;

        Ok(Self {
            n,
            diff,
            hh,
            jj,
            kk,
            e,
            k,
            hinv,
        })
    }

    /// 逐次求值：解运动学闭合
    ///
    /// ## 参数
    /// - `l`: 连杆半长 (m)
    /// - `phi`: 增广关节角 [φ_1 … φ_{N−1}, θ_N]（末位是尾连杆绝对朝向）
    /// - `phi_dot`: 对应角速度
    /// - `p`, `p_dot`: 头部参考点位置与速度
    ///
    /// ## 算法
    ///
    /// ```text
    /// θ  = HH·φ_aug                θ̇ = HH·φ̇_aug
    /// X  = Hinv·[ 2l·cosθ ; p_x − (l/N)·kᵀcosθ ]
    /// Y  = Hinv·[ 2l·sinθ ; p_y − (l/N)·kᵀsinθ ]
    /// Xc = K·X + l·cosθ            Yc = K·Y + l·sinθ
    /// ```
    ///
    /// 速度通过解析微分得到：角速度经 sin/cos 的导数（cosθ·θ̇ 与
    /// −sinθ·θ̇ 项）进入与位置完全相同的 Hinv 变换，保证位置输出与
    /// 速度输出严格一致，不引入数值微分误差。
    pub fn solve(
        &self,
        l: f32,
        phi: &DVector<f32>,
        phi_dot: &DVector<f32>,
        p: [f32; 2],
        p_dot: [f32; 2],
    ) -> LinkKinematics {
        let n = self.n;
        let nf = n as f32;

        let theta = &self.hh * phi;
        let theta_dot = &self.hh * phi_dot;

        let cos_t = theta.map(f32::cos);
        let sin_t = theta.map(f32::sin);
        // sin/cos 与 θ̇ 的逐项乘积，即 d(sinθ)/dt 与 −d(cosθ)/dt
        let sin_td = sin_t.component_mul(&theta_dot);
        let cos_td = cos_t.component_mul(&theta_dot);

        // ===== 位置 =====
        let mut rhs_x = DVector::zeros(n + 1);
        rhs_x.rows_mut(0, n).copy_from(&(&cos_t * (2.0 * l)));
        rhs_x[n] = p[0] - (l / nf) * self.k.dot(&cos_t);

        let mut rhs_y = DVector::zeros(n + 1);
        rhs_y.rows_mut(0, n).copy_from(&(&sin_t * (2.0 * l)));
        rhs_y[n] = p[1] - (l / nf) * self.k.dot(&sin_t);

        let x_ends = &self.hinv * rhs_x;
        let y_ends = &self.hinv * rhs_y;

        let xc = &self.kk * &x_ends + &cos_t * l;
        let yc = &self.kk * &y_ends + &sin_t * l;

        // ===== 速度（与位置同一变换的解析微分） =====
        let mut rhs_dx = DVector::zeros(n + 1);
        rhs_dx.rows_mut(0, n).copy_from(&(&sin_td * (-2.0 * l)));
        rhs_dx[n] = p_dot[0] + (l / nf) * self.k.dot(&sin_td);

        let mut rhs_dy = DVector::zeros(n + 1);
        rhs_dy.rows_mut(0, n).copy_from(&(&cos_td * (2.0 * l)));
        rhs_dy[n] = p_dot[1] - (l / nf) * self.k.dot(&cos_td);

        let dx_ends = &self.hinv * rhs_dx;
        let dy_ends = &self.hinv * rhs_dy;

        let xc_dot = &self.kk * &dx_ends - &sin_td * l;
        let yc_dot = &self.kk * &dy_ends + &cos_td * l;

        LinkKinematics {
            theta,
            theta_dot,
            xc,
            yc,
            xc_dot,
            yc_dot,
        }
    }
}

// ---------------------------------------------------------------------------
// 求解结果
// ---------------------------------------------------------------------------

/// 单次闭合求解的输出（每次求值重新计算，绝不跨调用缓存）
#[derive(Debug, Clone)]
pub struct LinkKinematics {
    /// 各连杆绝对朝向 (rad)
    pub theta: DVector<f32>,
    /// 各连杆绝对角速度 (rad/s)
    pub theta_dot: DVector<f32>,
    /// 连杆中心 x 坐标 (m)
    pub xc: DVector<f32>,
    /// 连杆中心 y 坐标 (m)
    pub yc: DVector<f32>,
    /// 连杆中心 x 速度 (m/s)
    pub xc_dot: DVector<f32>,
    /// 连杆中心 y 速度 (m/s)
    pub yc_dot: DVector<f32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 显式拼出 H = [J; (1/N)eᵀ] 验证 Hinv 确实是它的逆
    #[test]
    fn hinv_inverts_constraint_matrix() {
        for n in [2usize, 5, 14] {
            let sm = StructuralMatrices::new(n).unwrap();
            let mut h = DMatrix::zeros(n + 1, n + 1);
            h.view_mut((0, 0), (n, n + 1)).copy_from(&sm.jj);
            h.view_mut((n, 0), (1, n + 1))
                .copy_from(&(sm.e.transpose() / n as f32));

            let product = &h * &sm.hinv;
            let identity = DMatrix::<f32>::identity(n + 1, n + 1);
            assert_relative_eq!(product, identity, epsilon = 1e-4);
        }
    }

    #[test]
    fn cumulative_sum_recovers_orientations() {
        let sm = StructuralMatrices::new(4).unwrap();
        // φ_aug = [φ_1, φ_2, φ_3, θ_4]，θ_i = Σ_{j≥i} φ_aug_j
        let phi = DVector::from_vec(vec![0.1f32, -0.2, 0.3, 0.5]);
        let theta = &sm.hh * &phi;
        assert_relative_eq!(theta[3], 0.5, epsilon = 1e-6);
        assert_relative_eq!(theta[2], 0.8, epsilon = 1e-6);
        assert_relative_eq!(theta[1], 0.6, epsilon = 1e-6);
        assert_relative_eq!(theta[0], 0.7, epsilon = 1e-6);
        // D 是 HH 的左逆：D·θ = φ_1..φ_{N−1}
        let back = &sm.diff * &theta;
        for i in 0..3 {
            assert_relative_eq!(back[i], phi[i], epsilon = 1e-6);
        }
    }

    /// 全部 φ = 0 时链呈直线：θ 相等，中心 y 坐标收拢到同一值
    #[test]
    fn straight_chain_collapses_lateral_coordinates() {
        let n = 6;
        let l = 0.05;
        let sm = StructuralMatrices::new(n).unwrap();
        let phi = DVector::zeros(n);
        let phi_dot = DVector::zeros(n);
        let kin = sm.solve(l, &phi, &phi_dot, [0.3, -0.2], [0.0, 0.0]);

        for i in 0..n {
            assert_relative_eq!(kin.theta[i], 0.0, epsilon = 1e-6);
            assert_relative_eq!(kin.yc[i], -0.2, epsilon = 1e-5);
        }
        // 中心沿 x 均匀分布，均值等于参考点
        let mean_x = kin.xc.sum() / n as f32;
        assert_relative_eq!(mean_x, 0.3, epsilon = 1e-5);
        for i in 1..n {
            assert_relative_eq!(kin.xc[i] - kin.xc[i - 1], 2.0 * l, epsilon = 1e-5);
        }
    }

    /// 非零尾部朝向下所有 θ 仍然相等（直线但有斜度）
    #[test]
    fn straight_chain_inherits_base_orientation() {
        let n = 5;
        let sm = StructuralMatrices::new(n).unwrap();
        let mut phi = DVector::zeros(n);
        phi[n - 1] = 0.7;
        let kin = sm.solve(0.05, &phi, &DVector::zeros(n), [0.0, 0.0], [0.0, 0.0]);
        for i in 0..n {
            assert_relative_eq!(kin.theta[i], 0.7, epsilon = 1e-6);
        }
    }

    /// 速度输出与位置输出的有限差分一致（解析微分正确性）
    #[test]
    fn velocities_match_finite_difference() {
        let n = 5;
        let l = 0.0525;
        let sm = StructuralMatrices::new(n).unwrap();

        let phi = DVector::from_vec(vec![0.2f32, -0.1, 0.15, 0.05, 0.3]);
        let phi_dot = DVector::from_vec(vec![0.4f32, 0.1, -0.3, 0.2, -0.1]);
        let p = [0.1f32, -0.05];
        let p_dot = [0.02f32, 0.03];

        let h = 1e-3f32;
        let kin0 = sm.solve(l, &phi, &phi_dot, p, p_dot);
        let phi1 = &phi + &phi_dot * h;
        let p1 = [p[0] + p_dot[0] * h, p[1] + p_dot[1] * h];
        let kin1 = sm.solve(l, &phi1, &phi_dot, p1, p_dot);

        for i in 0..n {
            let fd_x = (kin1.xc[i] - kin0.xc[i]) / h;
            let fd_y = (kin1.yc[i] - kin0.yc[i]) / h;
            assert_relative_eq!(kin0.xc_dot[i], fd_x, epsilon = 2e-2);
            assert_relative_eq!(kin0.yc_dot[i], fd_y, epsilon = 2e-2);
        }
    }
}
