//! # 错误类型定义
//!
//! 仿真核心的错误分类：配置错误、维度错误、数值错误。
//! 所有失败都向调用方上报，核心内部不做任何自动恢复或重试。

use thiserror::Error;

/// 仿真核心统一错误类型
#[derive(Debug, Error)]
pub enum SnakeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 状态向量长度与 2N+4 不符（调用方错误）
    #[error("state dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("numerical failure: {0}")]
    Numerical(#[from] NumericalError),
}

/// 配置错误
///
/// 配置在构造时立即校验，绝不静默使用缺省值替代非法输入。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// 连杆数量至少为 2（至少存在一个关节）
    #[error("link count must be at least 2, got {0}")]
    TooFewLinks(usize),

    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// 摩擦模型数值编码只接受 0（Coulomb）或 1（viscous）
    #[error("invalid friction mode flag: {0} (expected 0 - Coulomb, 1 - viscous)")]
    InvalidFrictionMode(u8),

    /// 管壁接触数值编码只接受 0（关闭）或 1（开启）
    #[error("invalid contact mode flag: {0} (expected 0 - off, 1 - on)")]
    InvalidContactMode(u8),
}

/// 数值错误
///
/// 线性代数求解失败是确定性的：相同输入重试不会改变结果，
/// 因此直接上报而不重试。
#[derive(Debug, Error)]
pub enum NumericalError {
    /// 运动学闭合所需的结构矩阵奇异（或接近奇异）
    #[error("structural matrix {name} is singular")]
    SingularMatrix { name: &'static str },

    /// 质量矩阵求解失败
    #[error("mass matrix solve failed")]
    MassSolveFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_error_from_config_error() {
        let err = ConfigError::TooFewLinks(1);
        let snake_err: SnakeError = err.into();
        assert!(matches!(snake_err, SnakeError::Config(_)));
        assert!(snake_err.to_string().contains("at least 2"));
    }

    #[test]
    fn snake_error_from_numerical_error() {
        let err = NumericalError::SingularMatrix { name: "A" };
        let snake_err: SnakeError = err.into();
        assert!(matches!(snake_err, SnakeError::Numerical(_)));
        assert!(snake_err.to_string().contains("singular"));
    }

    #[test]
    fn dimension_error_display() {
        let err = SnakeError::Dimension {
            expected: 32,
            got: 30,
        };
        assert_eq!(
            err.to_string(),
            "state dimension mismatch: expected 32, got 30"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::TooFewLinks(0).to_string(),
            "link count must be at least 2, got 0"
        );
        assert_eq!(
            ConfigError::InvalidFrictionMode(7).to_string(),
            "invalid friction mode flag: 7 (expected 0 - Coulomb, 1 - viscous)"
        );
        assert_eq!(
            ConfigError::InvalidContactMode(3).to_string(),
            "invalid contact mode flag: 3 (expected 0 - off, 1 - on)"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "m",
                message: "must be positive".into()
            }
            .to_string(),
            "invalid value for m: must be positive"
        );
    }
}
