//! # 仿真参数配置
//!
//! 蛇形机器人管道内运动仿真的全部物理、摩擦、接触与控制参数。
//!
//! 配置记录一经构造并通过 [`SnakeConfig::validate`] 校验后即只读，
//! 以引用方式传入各个计算组件，避免参数集不完整或不一致。
//! 缺省值即文档化的 14 连杆标准场景参数（SI 单位制）。

use serde::{Deserialize, Serialize};

use crate::snake::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde 缺省值函数
// ---------------------------------------------------------------------------

const fn default_n() -> usize {
    14
}
const fn default_m() -> f32 {
    0.406
}
const fn default_l() -> f32 {
    0.0525
}
const fn default_g() -> f32 {
    9.81
}
const fn default_diameter() -> f32 {
    0.30
}
const fn default_diameter_influence() -> f32 {
    0.10
}
const fn default_dt() -> f32 {
    0.01
}
const fn default_ct() -> f32 {
    0.015
}
const fn default_cn() -> f32 {
    0.03
}
const fn default_ut() -> f32 {
    0.15
}
const fn default_un() -> f32 {
    0.3
}
const fn default_ct_pipe() -> f32 {
    0.08
}
const fn default_ut_pipe() -> f32 {
    0.2
}
const fn default_umax() -> f32 {
    3.0
}
const fn default_qmax() -> f32 {
    4.0
}
const fn default_erub() -> f32 {
    400_000.0
}
const fn default_vrub() -> f32 {
    0.49
}
const fn default_min_link_vel() -> f32 {
    0.001
}
const fn default_friction() -> FrictionMode {
    FrictionMode::Viscous
}
const fn default_contact() -> ContactMode {
    ContactMode::On
}
const fn default_kp() -> f32 {
    25.0
}
const fn default_kd() -> f32 {
    10.0
}
const fn default_alpha_a() -> f32 {
    0.3981
}
const fn default_omega() -> f32 {
    0.6936
}
const fn default_delta() -> f32 {
    0.4914
}

// ---------------------------------------------------------------------------
// 模式选择
// ---------------------------------------------------------------------------

/// 摩擦模型选择
///
/// 两种模型互斥。数值编码（外部表单输入）：0 - Coulomb，1 - viscous。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionMode {
    /// 库仑摩擦：力正比于速度符号，幅值由法向载荷决定
    Coulomb,
    /// 粘性摩擦：力正比于速度
    Viscous,
}

impl FrictionMode {
    /// 从数值编码解析，编码之外的取值是配置错误
    pub fn from_flag(flag: u8) -> Result<Self, ConfigError> {
        match flag {
            0 => Ok(Self::Coulomb),
            1 => Ok(Self::Viscous),
            other => Err(ConfigError::InvalidFrictionMode(other)),
        }
    }
}

/// 管壁接触选择
///
/// 数值编码（外部表单输入）：0 - 无接触，1 - 有接触。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMode {
    /// 不计算管壁法向力
    Off,
    /// 超出有效管径时施加 Hertz 型管壁法向力
    On,
}

impl ContactMode {
    /// 从数值编码解析，编码之外的取值是配置错误
    pub fn from_flag(flag: u8) -> Result<Self, ConfigError> {
        match flag {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(ConfigError::InvalidContactMode(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// SnakeConfig
// ---------------------------------------------------------------------------

/// 仿真配置记录（每次仿真构造一次，之后只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeConfig {
    /// 连杆数量 N（N ≥ 2）
    #[serde(default = "default_n")]
    pub n: usize,
    /// 单个连杆质量 (kg)
    #[serde(default = "default_m")]
    pub m: f32,
    /// 连杆半长，同时是连杆半径 (m)
    #[serde(default = "default_l")]
    pub l: f32,
    /// 重力加速度 (m/s²)
    #[serde(default = "default_g")]
    pub g: f32,
    /// 管道直径 (m)
    #[serde(default = "default_diameter")]
    pub diameter: f32,
    /// 管壁影响辅助常数 (m)，收窄接触起始的有效管径
    #[serde(default = "default_diameter_influence")]
    pub diameter_influence: f32,
    /// 积分时间步长 (s)
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// 地面切向粘性摩擦系数
    #[serde(default = "default_ct")]
    pub ct: f32,
    /// 地面法向粘性摩擦系数
    #[serde(default = "default_cn")]
    pub cn: f32,
    /// 地面切向库仑摩擦系数
    #[serde(default = "default_ut")]
    pub ut: f32,
    /// 地面法向库仑摩擦系数
    #[serde(default = "default_un")]
    pub un: f32,
    /// 管壁切向粘性摩擦系数
    #[serde(default = "default_ct_pipe")]
    pub ct_pipe: f32,
    /// 管壁切向库仑摩擦系数
    #[serde(default = "default_ut_pipe")]
    pub ut_pipe: f32,

    /// 单关节最大驱动力矩 (N·m)
    #[serde(default = "default_umax")]
    pub umax: f32,
    /// 管壁接触力饱和值 (N)
    #[serde(default = "default_qmax")]
    pub qmax: f32,
    /// 管壁接触等效弹性模量 (Pa)
    #[serde(default = "default_erub")]
    pub erub: f32,
    /// 管壁接触泊松比
    #[serde(default = "default_vrub")]
    pub vrub: f32,
    /// 库仑摩擦符号函数的最小速度阈值 (m/s)，避免零速度处的除零
    #[serde(default = "default_min_link_vel")]
    pub min_link_vel: f32,

    /// 摩擦模型选择
    #[serde(default = "default_friction")]
    pub friction: FrictionMode,
    /// 管壁接触选择
    #[serde(default = "default_contact")]
    pub contact: ContactMode,

    /// 位置控制器增益
    #[serde(default = "default_kp")]
    pub kp: f32,
    /// 速度控制器增益
    #[serde(default = "default_kd")]
    pub kd: f32,
    /// 步态参考幅值 α (rad)
    #[serde(default = "default_alpha_a")]
    pub alpha_a: f32,
    /// 步态角频率 ω (rad/s)
    #[serde(default = "default_omega")]
    pub omega: f32,
    /// 相邻关节相位差 δ (rad)
    #[serde(default = "default_delta")]
    pub delta: f32,
    /// 关节角偏置常数 (rad)，叠加在正弦参考上用于转向
    #[serde(default)]
    pub offset: f32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            m: default_m(),
            l: default_l(),
            g: default_g(),
            diameter: default_diameter(),
            diameter_influence: default_diameter_influence(),
            dt: default_dt(),
            ct: default_ct(),
            cn: default_cn(),
            ut: default_ut(),
            un: default_un(),
            ct_pipe: default_ct_pipe(),
            ut_pipe: default_ut_pipe(),
            umax: default_umax(),
            qmax: default_qmax(),
            erub: default_erub(),
            vrub: default_vrub(),
            min_link_vel: default_min_link_vel(),
            friction: default_friction(),
            contact: default_contact(),
            kp: default_kp(),
            kd: default_kd(),
            alpha_a: default_alpha_a(),
            omega: default_omega(),
            delta: default_delta(),
            offset: 0.0,
        }
    }
}

impl SnakeConfig {
    /// 校验配置，非法取值立即返回错误
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n < 2 {
            return Err(ConfigError::TooFewLinks(self.n));
        }
        if self.m <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "m",
                message: format!("must be positive, got {}", self.m),
            });
        }
        if self.l <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "l",
                message: format!("must be positive, got {}", self.l),
            });
        }
        if self.diameter <= 2.0 * self.l {
            return Err(ConfigError::InvalidValue {
                field: "diameter",
                message: format!(
                    "pipe diameter {} must exceed link diameter {}",
                    self.diameter,
                    2.0 * self.l
                ),
            });
        }
        if self.dt <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "dt",
                message: format!("must be positive, got {}", self.dt),
            });
        }
        if self.min_link_vel <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "min_link_vel",
                message: format!("must be positive, got {}", self.min_link_vel),
            });
        }
        if self.umax <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "umax",
                message: format!("must be positive, got {}", self.umax),
            });
        }
        Ok(())
    }

    /// 扣除连杆直径后的自由管径 d = diameter − 2l (m)
    pub fn free_diameter(&self) -> f32 {
        self.diameter - 2.0 * self.l
    }

    /// 接触起始的有效管壁半径 (m)
    ///
    /// 自由管径再按影响常数收窄后的一半。
    pub fn wall_radius(&self) -> f32 {
        0.5 * (self.free_diameter() - self.diameter_influence)
    }

    /// 连杆绕端点的转动惯量 I = m(2l)²/3 (kg·m²)
    pub fn link_inertia(&self) -> f32 {
        self.m * (2.0 * self.l).powi(2) / 3.0
    }

    /// 从 TOML 文件加载并校验
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
