//! 报表编排
//!
//! - `executor`: 外部查询执行器接口
//! - `service`: 报表生成服务（校验、缓存、执行、转换）

pub mod executor;
pub mod service;


pub use executor::{QueryExecutor, QueryOutput, UnconfiguredExecutor};
pub use service::ReportService;
