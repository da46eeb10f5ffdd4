//! # 蛇形机器人管道动力学框架
//!
//! 模拟多连杆蛇形机器人在刚性圆柱管道内的平面运动，核心是一个纯函数
//! 导数求值器 ẋ = f(t, x, 配置)，作为数值 ODE 积分器的右端项。
//!
//! ## 核心概念
//!
//! - **运动学闭合 (Kinematic Closure)**: 由相对关节角经冗余消解伪逆
//!   恢复连杆绝对姿态与中心位置/速度
//! - **摩擦/接触 (Friction & Contact)**: 粘性或库仑地面摩擦，可选的
//!   Hertz 型管壁接触力
//! - **步态控制 (Gait Control)**: PD 跟踪逐关节相移的正弦参考轨迹
//! - **运动方程 (Equations of Motion)**: 对角质量矩阵下求解角加速度，
//!   整链力平衡给出头部平动加速度
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use crate::snake::*;
//!
//! let config = SnakeConfig::default();
//! let model = SnakeModel::new(config)?;
//! let x0 = nalgebra::DVector::zeros(model.state_len());
//! let trajectory = simulate(&model, x0, 0.0, 20.0, 0.01)?;
//! ```

pub mod config;
pub mod controller;
pub mod dynamics;
pub mod error;
pub mod friction;
pub mod integrator;
pub mod kinematics;

// Re-export commonly used types
pub use config::{ContactMode, FrictionMode, SnakeConfig};
pub use dynamics::SnakeModel;
pub use error::{ConfigError, NumericalError, SnakeError};
pub use integrator::{rk4_step, simulate, Trajectory};
