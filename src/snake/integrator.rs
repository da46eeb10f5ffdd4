//! # 时间积分模块
//!
//! 数值积分器驱动导数求值，把动力学模型推进成整条时间轨迹。
//!
//! 求值入口是无状态纯函数，积分器可以在一步之内以任意中间时刻
//! 反复调用它（RK4 的四个阶段），不依赖调用顺序。

use nalgebra::DVector;
use tracing::debug;

use crate::snake::dynamics::SnakeModel;
use crate::snake::error::SnakeError;

/// 仿真轨迹：采样时刻与对应的状态行
///
/// 由积分器产生后只读，行的排布与状态向量约定一致。
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub times: Vec<f32>,
    pub states: Vec<DVector<f32>>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 第 i 个采样的头部参考点位置 (p_x, p_y)
    pub fn head_position(&self, i: usize) -> [f32; 2] {
        let n = (self.states[i].len() - 4) / 2;
        [self.states[i][n], self.states[i][n + 1]]
    }
}

/// RK4 (Runge-Kutta 4阶) 单步推进
///
/// ## 理论背景
///
/// 对常微分方程 dy/dt = f(t, y)，RK4 用四个斜率的加权平均更新状态：
///
/// ```text
/// k₁ = f(t, y)
/// k₂ = f(t + h/2, y + h/2·k₁)
/// k₃ = f(t + h/2, y + h/2·k₂)
/// k₄ = f(t + h, y + h·k₃)
/// y_{n+1} = y_n + h/6·(k₁ + 2k₂ + 2k₃ + k₄)
/// ```
///
/// 局部截断误差 O(h⁵)，全局误差 O(h⁴)，适合长时间仿真。
///
/// ## 参数
/// - `model`: 动力学模型
/// - `t`: 当前时刻 (s)
/// - `x`: 当前状态
/// - `dt`: 时间步长 (s)
///
/// ## 失败
/// 任一阶段的导数求值失败即中止整步并向上传播错误。
pub fn rk4_step(
    model: &SnakeModel,
    t: f32,
    x: &DVector<f32>,
    dt: f32,
) -> Result<DVector<f32>, SnakeError> {
    // ==================== Stage 1: k1 = f(t, y) ====================
    let k1 = model.derivative(t, x)?;

    // =============== Stage 2: k2 = f(t + h/2, y + h/2*k1) ===============
    let k2 = model.derivative(t + 0.5 * dt, &(x + &k1 * (0.5 * dt)))?;

    // =============== Stage 3: k3 = f(t + h/2, y + h/2*k2) ===============
    let k3 = model.derivative(t + 0.5 * dt, &(x + &k2 * (0.5 * dt)))?;

    // ================ Stage 4: k4 = f(t + h, y + h*k3) ================
    let k4 = model.derivative(t + dt, &(x + &k3 * dt))?;

    // ====== Final update: y_next = y + h/6*(k1 + 2*k2 + 2*k3 + k4) ======
    Ok(x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
}

/// 在 [t0, t_end] 上按固定步长积分，返回完整轨迹
///
/// 采样时刻按 t_i = t0 + i·dt 计算（而不是逐步累加），
/// 避免浮点累加漂移影响参考轨迹的相位。
pub fn simulate(
    model: &SnakeModel,
    x0: DVector<f32>,
    t0: f32,
    t_end: f32,
    dt: f32,
) -> Result<Trajectory, SnakeError> {
    let steps = ((t_end - t0) / dt).round() as usize;
    debug!(steps, dt, "starting fixed-step integration");

    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    times.push(t0);
    states.push(x0);

    for i in 0..steps {
        let t = t0 + i as f32 * dt;
        let next = rk4_step(model, t, &states[i], dt)?;
        times.push(t0 + (i + 1) as f32 * dt);
        states.push(next);
    }

    Ok(Trajectory { times, states })
}
