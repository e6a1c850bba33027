// lib.rs - 报表引擎库入口

pub mod core;
pub mod data;
pub mod models;
pub mod services;
pub mod utils;

pub use models::*;
pub use services::{
    DefinitionStore, DefinitionWatcher, QueryExecutor, QueryOutput, ReportService,
    UnconfiguredExecutor,
};

// 导出核心模块
pub use crate::core::{init_logger, update_log_level, ConfigError, ReportError, ValidationError};
