//! 数据层
//!
//! 报表定义文件的读取与报表响应的缓存。
//!
//! # 模块组织
//!
//! - `error`: 数据层错误类型
//! - `cache`: 带过期时间的响应缓存与缓存键计算
//! - `managers`: 定义文件读取（JSON/TOML）

pub mod cache;
pub mod error;
pub mod managers;

pub use error::{DataError, Result};
