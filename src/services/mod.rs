// 服务层模块
//
// - definition: 报表定义加载、安全检查、存储与目录监听
// - params: 参数类型校验与默认值解析
// - query: 命名占位符到位置占位符的转换
// - transform: 表格结果到记录的转换
// - report: 报表编排（执行器接口 + 报表服务）

pub mod definition;
pub mod params;
pub mod query;
pub mod report;
pub mod transform;

pub use definition::{DefinitionStore, DefinitionWatcher};
pub use params::ParameterValidator;
pub use query::{BuiltQuery, QueryBuilder};
pub use report::{QueryExecutor, QueryOutput, ReportService, UnconfiguredExecutor};
