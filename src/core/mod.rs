//! 核心基础设施层
//!
//! - `error`: 定义加载、参数校验与报表生成的错误体系
//! - `logger`: 基于 tracing 的日志初始化与动态级别调整

pub mod error;
pub mod logger;

pub use error::{ConfigError, ReportError, Result, ValidationError};
pub use logger::{init_logger, update_log_level};
