//! # 场景模块
//!
//! 预置的仿真场景定义。

pub mod pipeline;

pub use pipeline::{create_pipeline_scenario, initial_state, DEFAULT_DURATION};
