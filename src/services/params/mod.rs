//! 参数校验
//!
//! - `kinds`: 按声明类型分派的校验器
//! - `defaults`: 默认值与相对日期表达式解析
//! - `format`: 日期模板转换
//! - `validator`: 按声明顺序校验并填充默认值

pub mod defaults;
pub mod format;
pub mod kinds;
pub mod validator;

pub use defaults::{resolve_default, resolve_default_at};
pub use kinds::{validator_for, ParamValidator};
pub use validator::ParameterValidator;
